//! Conditions raised by builtins and the evaluator
//!
//! Every user-visible message is a [`Message`] variant whose `Display` is the
//! exact text the language prints. [`RError`] aborts the current top-level
//! expression; [`RWarning`] is recorded on the context and never aborts.

use crate::span::Span;
use thiserror::Error;

/// Result type used throughout the runtime
pub type RResult<T> = Result<T, RError>;

/// Message keys with their printed text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Message {
    // ------------------------------------------------------------------
    // Argument matching and evaluation
    // ------------------------------------------------------------------
    #[error("argument \"{0}\" is missing, with no default")]
    ArgumentMissing(String),
    #[error("unused argument ({0})")]
    UnusedArgument(String),
    #[error("unused arguments ({0})")]
    UnusedArguments(String),
    #[error("formal argument \"{0}\" matched by multiple actual arguments")]
    FormalMatchedMultiple(String),
    #[error("argument {0} matches multiple formal arguments")]
    ArgumentMatchesMultiple(usize),
    #[error("object '{0}' not found")]
    ObjectNotFound(String),
    #[error("object '{0}' of mode '{1}' was not found")]
    ObjectOfModeNotFound(String, String),
    #[error("could not find function \"{0}\"")]
    CouldNotFindFunction(String),
    #[error("attempt to apply non-function")]
    ApplyNonFunction,
    #[error("'...' used in an incorrect context")]
    DotsOutsideFunction,
    #[error("promise already under evaluation: recursive default argument reference or earlier problems?")]
    PromiseCycle,
    #[error("evaluation nested too deeply: infinite recursion / options(expressions=)?")]
    NestingTooDeep,
    #[error("invalid (do_set) left-hand side to assignment")]
    InvalidAssignmentTarget,
    #[error("argument is of length zero")]
    ArgumentOfLengthZero,
    #[error("missing value where TRUE/FALSE needed")]
    MissingValueTrueFalse,
    #[error("argument is not interpretable as logical")]
    NotInterpretableAsLogical,
    #[error("the condition has length > 1")]
    ConditionLengthGreaterThanOne,

    // ------------------------------------------------------------------
    // Casts
    // ------------------------------------------------------------------
    #[error("invalid '{0}' argument")]
    InvalidArgument(String),
    #[error("invalid '{0}' value")]
    InvalidValue(String),
    #[error("invalid argument")]
    InvalidUnnamedArgument,
    #[error("invalid argument type")]
    InvalidArgumentType,
    #[error("invalid first argument")]
    InvalidFirstArgument,
    #[error("invalid 'type' ({0}) of argument")]
    InvalidTypeOfArgument(String),
    #[error("'{0}' must be TRUE or FALSE")]
    MustBeTrueFalse(String),
    #[error("'{0}' must be a character vector")]
    MustBeCharacter(String),
    #[error("'{0}' must be a single string")]
    MustBeSingleString(String),
    #[error("non-numeric argument to mathematical function")]
    NonNumericMath,
    #[error("non-numeric argument to binary operator")]
    NonNumericBinary,
    #[error("invalid argument to unary operator")]
    InvalidUnaryArgument,
    #[error("operations are possible only for numeric, logical or complex types")]
    LogicalOperationType,
    #[error("comparison of these types is not implemented")]
    ComparisonNotImplemented,
    #[error("invalid comparison with complex values")]
    InvalidComplexComparison,
    #[error("invalid operation on complex numbers")]
    InvalidComplexOperation,
    #[error("invalid 'x' type in 'x {0} y'")]
    InvalidXType(String),
    #[error("invalid 'y' type in 'x {0} y'")]
    InvalidYType(String),
    #[error("'length = {0}' in coercion to 'logical(1)'")]
    LengthInCoercionToLogical(usize),
    #[error("({0}) object cannot be coerced to type '{1}'")]
    CannotCoerce(String, String),
    #[error("vector: cannot make a vector of mode '{0}'.")]
    CannotMakeVectorOfMode(String),
    #[error("is.na() applied to non-(list or vector) of type '{0}'")]
    IsNaNonVector(String),
    #[error("default method not implemented for type '{0}'")]
    DefaultMethodNotImplemented(String),
    #[error("argument is not a function")]
    NotAFunction,
    #[error("'{0}' is not a function, character or symbol")]
    NotFunctionCharacterSymbol(String),

    // ------------------------------------------------------------------
    // Coercion warnings
    // ------------------------------------------------------------------
    #[error("NAs introduced by coercion")]
    NasIntroducedByCoercion,
    #[error("NAs introduced by coercion to integer range")]
    NasIntroducedByCoercionIntRange,
    #[error("imaginary parts discarded in coercion")]
    ImaginaryPartsDiscarded,
    #[error("out-of-range values treated as 0 in coercion to raw")]
    OutOfRangeRaw,

    // ------------------------------------------------------------------
    // Summaries and scans
    // ------------------------------------------------------------------
    #[error("coercing argument of type '{0}' to logical")]
    CoercingToLogical(String),
    #[error("integer overflow - use sum(as.numeric(.))")]
    IntegerOverflowSum,
    #[error("no non-missing arguments to {0}; returning {1}")]
    NoNonMissingReturning(String, String),
    #[error("no non-missing arguments to {0}")]
    NoNonMissing(String),
    #[error("argument is not numeric or logical: returning NA")]
    NotNumericReturningNa,
    #[error("integer overflow in '{0}'; use '{0}(as.numeric(.))'")]
    IntegerOverflowCumulative(String),
    #[error("'{0}' not defined for complex numbers")]
    NotDefinedForComplex(String),
    #[error("NAs produced by integer overflow")]
    IntegerOverflow,
    #[error("longer object length is not a multiple of shorter object length")]
    LengthNotMultiple,

    // ------------------------------------------------------------------
    // Math
    // ------------------------------------------------------------------
    #[error("NaNs produced")]
    NansProduced,
    #[error("'k' ({0}) must be integer, rounded to {1}")]
    ChooseRoundedK(String, String),
    #[error("unimplemented complex function")]
    UnimplementedComplexFunction,

    // ------------------------------------------------------------------
    // Binning, ordering, matching
    // ------------------------------------------------------------------
    #[error("'breaks' is not sorted")]
    BreaksNotSorted,
    #[error("argument lengths differ")]
    ArgumentLengthsDiffer,
    #[error("raw vectors cannot be sorted")]
    RawSort,
    #[error("'{0}' is only for atomic vectors")]
    OnlyAtomic(String),
    #[error("'{0}' must be atomic")]
    MustBeAtomic(String),
    #[error("'match' requires vector arguments")]
    MatchRequiresVectors,

    // ------------------------------------------------------------------
    // Subscripts
    // ------------------------------------------------------------------
    #[error("subscript out of bounds")]
    SubscriptOutOfBounds,
    #[error("can't mix positive and negative subscripts")]
    MixedSubscripts,
    #[error("invalid subscript type '{0}'")]
    InvalidSubscriptType(String),
    #[error("$ operator is invalid for atomic vectors")]
    DollarOnAtomic,
    #[error("Coercing LHS to a list")]
    CoercingLhsToList,
    #[error("object of type '{0}' is not subsettable")]
    NotSubsettable(String),
    #[error("attempt to select more than one element")]
    SelectMoreThanOne,
    #[error("attempt to select less than one element")]
    SelectLessThanOne,
    #[error("incorrect number of dimensions")]
    IncorrectDimensions,
    #[error("incorrect number of subscripts on matrix")]
    IncorrectSubscriptsMatrix,
    #[error("replacement has length zero")]
    ReplacementLengthZero,
    #[error("number of items to replace is not a multiple of replacement length")]
    ReplacementNotMultiple,
    #[error("NAs are not allowed in subscripted assignments")]
    NaInSubscriptedAssignment,
    #[error("more elements supplied than there are to replace")]
    MoreElementsSupplied,
    #[error("wrong arguments for subsetting an environment")]
    WrongArgsForSubsettingEnv,

    // ------------------------------------------------------------------
    // Matrices
    // ------------------------------------------------------------------
    #[error("invalid '{0}' value (too large or NA)")]
    DimTooLargeOrNa(String),
    #[error("invalid '{0}' value (< 0)")]
    DimNegative(String),
    #[error("non-numeric matrix extent")]
    NonNumericMatrixExtent,
    #[error("data length [{0}] is not a sub-multiple or multiple of the number of rows [{1}]")]
    MatrixDataRows(usize, usize),
    #[error("data length [{0}] is not a sub-multiple or multiple of the number of columns [{1}]")]
    MatrixDataColumns(usize, usize),
    #[error("'data' must be of a vector type, was '{0}'")]
    MatrixDataNotVector(String),
    #[error("only matrix diagonals can be replaced")]
    OnlyMatrixDiagonals,
    #[error("replacement diagonal has wrong length")]
    ReplacementDiagonalLength,
    #[error("'x' is an array, but not one-dimensional.")]
    NotOneDimensional,
    #[error("argument is not a matrix")]
    ArgumentNotMatrix,
    #[error("length of 'dimnames' [{0}] must match that of 'dims' [{1}]")]
    DimnamesLength(usize, usize),
    #[error("length of 'dimnames' [{0}] not equal to array extent")]
    DimnamesExtent(usize),
    #[error("'dimnames' applied to non-array")]
    DimnamesNonArray,
    #[error("'dimnames' must be a list")]
    DimnamesNotList,
    #[error("'{0}' must have positive length")]
    MustHavePositiveLength(String),
    #[error("'nrow' or 'ncol' cannot be specified when 'x' is a matrix")]
    DiagDimsWithMatrix,
    #[error("nc = 0 for non-null data")]
    ZeroColumnsNonNullData,

    // ------------------------------------------------------------------
    // Polynomial roots
    // ------------------------------------------------------------------
    #[error("invalid polynomial coefficient")]
    InvalidPolynomialCoefficient,
    #[error("root finding code failed")]
    RootFindingFailed,

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------
    #[error("'names' attribute [{0}] must be the same length as the vector [{1}]")]
    NamesLength(usize, usize),
    #[error("dims [product {0}] do not match the length of object [{1}]")]
    DimsProduct(i64, usize),
    #[error("the dims contain missing or negative values")]
    DimsInvalid,
    #[error("attributes must be named")]
    AttributesMustBeNamed,
    #[error("exactly one attribute 'which' must be given")]
    ExactlyOneWhich,
    #[error("cannot set attribute on a {0}")]
    CannotSetAttribute(String),
    #[error("'what' must be a character vector")]
    WhatMustBeCharacter,
    #[error("attempt to set invalid 'class' attribute")]
    InvalidClassAttribute,

    // ------------------------------------------------------------------
    // Sequences and strings
    // ------------------------------------------------------------------
    #[error("argument of length 0")]
    ArgumentOfLength0,
    #[error("NA/NaN argument")]
    NaNanArgument,
    #[error("argument must be coercible to non-negative integer")]
    NonNegativeInteger,
    #[error("attempt to replicate an object of type '{0}'")]
    ReplicateType(String),
    #[error("'from' must be a finite number")]
    FromMustBeFinite,
    #[error("'to' must be a finite number")]
    ToMustBeFinite,
    #[error("wrong sign in 'by' argument")]
    WrongSignInBy,
    #[error("invalid '(to - from)/by' in seq(.)")]
    InvalidSeqBy,
    #[error("result would be too long a vector")]
    TooLongVector,
    #[error("invalid regular expression '{0}', reason '{1}'")]
    InvalidRegex(String, String),
    #[error("non-character argument")]
    NonCharacterArgument,
    #[error("non-character object(s)")]
    NonCharacterObjects,
    #[error("'nchar()' requires a character vector")]
    NcharNonCharacter,
    #[error("invalid substring arguments")]
    InvalidSubstringArguments,
    #[error("argument 'ignore.case = TRUE' will be ignored")]
    IgnoreCaseWithFixed,

    // ------------------------------------------------------------------
    // Apply family
    // ------------------------------------------------------------------
    #[error("values must be length {0},\n but FUN(X[[{1}]]) result is length {2}")]
    VapplyLength(usize, usize, usize),
    #[error("values must be type '{0}',\n but FUN(X[[{1}]]) result is type '{2}'")]
    VapplyType(String, usize, String),
    #[error("dim(X) must have a positive length")]
    DimMustBePositive,
    #[error("second argument must be a list")]
    SecondArgumentMustBeList,
    #[error("'what' must be a function or character string")]
    WhatMustBeFunction,
    #[error("'{0}' must be a vector")]
    MustBeVector(String),

    // ------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------
    #[error("argument is not an environment")]
    NotAnEnvironment,
    #[error("use of NULL environment is defunct")]
    NullEnvironment,
    #[error("cannot add bindings to a locked environment")]
    EnvAddBindings,
    #[error("cannot change value of locked binding for '{0}'")]
    EnvChangeBinding(String),
    #[error("cannot assign values in the empty environment")]
    EnvAssignEmpty,
    #[error("cannot remove bindings from a locked environment")]
    EnvRemoveBindings,
    #[error("cannot remove variables from the {0} environment")]
    EnvRemoveVariables(String),
    #[error("detaching \"package:base\" is not allowed")]
    EnvDetachBase,
    #[error("invalid '{0}' argument")]
    InvalidPos(String),
    #[error("'attach' only works for lists, data frames and environments")]
    AttachBadType,
    #[error("not that many frames on the stack")]
    NotThatManyFrames,
    #[error("... must contain names or character strings")]
    DotsMustBeNames,
    #[error("the empty environment has no parent")]
    EmptyEnvHasNoParent,
    #[error("no binding for \"{0}\"")]
    NoBindingFor(String),

    // ------------------------------------------------------------------
    // Language
    // ------------------------------------------------------------------
    #[error("duplicate 'switch' defaults: '{0}' and '{1}'")]
    DuplicateSwitchDefault(String, String),
    #[error("empty alternative in numeric switch")]
    EmptyNumericSwitch,
    #[error("EXPR must be a length 1 vector")]
    ExprNotLengthOne,
    #[error("'switch' with no alternatives")]
    SwitchNoAlternatives,
    #[error("'missing' can only be used for arguments")]
    MissingOnlyForArguments,
    #[error("invalid use of 'missing'")]
    InvalidUseOfMissing,
    #[error("'{0}' is not a valid function for on.exit")]
    InvalidOnExit(String),

    // ------------------------------------------------------------------
    // Random numbers
    // ------------------------------------------------------------------
    #[error("cannot take a sample larger than the population when 'replace = FALSE'")]
    SampleLargerThanPopulation,
    #[error("incorrect number of probabilities")]
    IncorrectNumProbabilities,
    #[error("NA in probability vector")]
    NaInProbability,
    #[error("negative probability")]
    NegativeProbability,
    #[error("too few positive probabilities")]
    TooFewPositiveProbabilities,
    #[error("This algorithm is for size <= n/2")]
    Sample2Size,
    #[error("supplied seed is not a valid integer")]
    InvalidSeed,
    #[error("invalid arguments")]
    InvalidArguments,
    #[error("NAs produced")]
    NasProduced,

    // ------------------------------------------------------------------
    // OS-facing
    // ------------------------------------------------------------------
    #[error("path[{0}]=\"{1}\": No such file or directory")]
    NoSuchFile(usize, String),
    #[error("running command '{0}' had status {1}")]
    CommandStatus(String, i32),
    #[error("error in running command")]
    CommandFailed,
    #[error("cannot open file '{0}': {1}")]
    CannotOpenFile(String, String),
    #[error("Line starting '{0} ...' is malformed!")]
    DcfMalformed(String),
    #[error("cannot create 'R_TempDir'")]
    CannotCreateTempDir,
    #[error("wrong length for argument")]
    WrongLengthForArgument,
    #[error("all arguments must be named")]
    AllArgumentsMustBeNamed,
    #[error("invalid filename specification")]
    InvalidFilenameSpecification,
    #[error("cannot write to the console: {0}")]
    ConsoleWrite(String),

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------
    #[error("list argument has no valid names")]
    ListHasNoValidNames,
    #[error("invalid '{0}' parameter, allowed {1}...{2}")]
    InvalidOptionRange(String, i64, i64),

    // ------------------------------------------------------------------
    // Free text
    // ------------------------------------------------------------------
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Custom(String),
}

/// Render a condition the way the console prints it
fn render(kind: &str, call: Option<&str>, message: &Message) -> String {
    match call {
        Some(call) => format!("{} in {} : {}", kind, call, message),
        None => format!("{}: {}", kind, message),
    }
}

/// An error condition
///
/// `call` holds the deparsed call the error is attributed to. Once an error
/// has been located (given a call, or explicitly none via `stop(call. = FALSE)`)
/// outer frames leave it alone.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render("Error", .call.as_deref(), .message))]
pub struct RError {
    pub call: Option<String>,
    pub message: Message,
    pub(crate) located: bool,
}

impl RError {
    pub fn new(message: Message) -> Self {
        Self {
            call: None,
            message,
            located: false,
        }
    }

    /// Error attributed to `call`
    pub fn in_call(message: Message, call: impl Into<String>) -> Self {
        Self {
            call: Some(call.into()),
            message,
            located: true,
        }
    }

    /// Error that deliberately carries no call
    pub fn without_call(message: Message) -> Self {
        Self {
            call: None,
            message,
            located: true,
        }
    }

    pub fn is_located(&self) -> bool {
        self.located
    }

    /// Attach a call unless one has already been decided
    pub fn locate(mut self, call: impl FnOnce() -> String) -> Self {
        if !self.located {
            self.call = Some(call());
            self.located = true;
        }
        self
    }

    /// Mark as located without a call (top level)
    pub(crate) fn settle(mut self) -> Self {
        self.located = true;
        self
    }
}

impl From<Message> for RError {
    fn from(message: Message) -> Self {
        RError::new(message)
    }
}

/// A warning condition
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render("Warning", .call.as_deref(), .message))]
pub struct RWarning {
    pub call: Option<String>,
    pub message: Message,
}

impl RWarning {
    pub fn new(call: Option<String>, message: Message) -> Self {
        Self { call, message }
    }
}

/// Error produced by the lexer or parser
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span}: {message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl From<ParseError> for RError {
    fn from(err: ParseError) -> Self {
        RError::without_call(Message::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_with_call() {
        let err = RError::in_call(Message::BreaksNotSorted, "bincode(x, b)");
        assert_eq!(err.to_string(), "Error in bincode(x, b) : 'breaks' is not sorted");
    }

    #[test]
    fn test_error_display_without_call() {
        let err = RError::new(Message::ObjectNotFound("x".to_string()));
        assert_eq!(err.to_string(), "Error: object 'x' not found");
    }

    #[test]
    fn test_locate_only_once() {
        let err = RError::new(Message::ApplyNonFunction)
            .locate(|| "f()".to_string())
            .locate(|| "g()".to_string());
        assert_eq!(err.call.as_deref(), Some("f()"));

        let err = RError::without_call(Message::Custom("boom".to_string()))
            .locate(|| "h()".to_string());
        assert_eq!(err.call, None);
    }

    #[test]
    fn test_warning_display() {
        let w = RWarning::new(Some("sqrt(-1)".to_string()), Message::NansProduced);
        assert_eq!(w.to_string(), "Warning in sqrt(-1) : NaNs produced");
    }

    #[test]
    fn test_message_text() {
        assert_eq!(
            Message::IntegerOverflowCumulative("cumsum".to_string()).to_string(),
            "integer overflow in 'cumsum'; use 'cumsum(as.numeric(.))'"
        );
        assert_eq!(
            Message::NoNonMissingReturning("max".to_string(), "-Inf".to_string()).to_string(),
            "no non-missing arguments to max; returning -Inf"
        );
    }
}
