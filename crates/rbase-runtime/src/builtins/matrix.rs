//! Matrix construction and manipulation: `matrix`, `diag`, `diag<-`, `t`
//!
//! Matrices are column-major vectors carrying an integer `dim` attribute of
//! length two and optionally a two-element `dimnames` list.

use crate::args::Args;
use crate::builtins::{assign_element, names_of, BuiltinSpec};
use crate::casts::{self, to_bool};
use crate::coerce::{self, common_kind};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Kind, RStr, Value, Vector, VectorData};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("matrix", &["data", "nrow", "ncol", "byrow", "dimnames"], builtin_matrix),
    BuiltinSpec::eager("diag", &["x", "nrow", "ncol", "names"], builtin_diag),
    BuiltinSpec::eager("diag<-", &["x", "value"], builtin_diag_assign),
    BuiltinSpec::eager("t", &["x"], builtin_t),
];

type Names = Option<Vec<Option<RStr>>>;

// ============================================================================
// Dimnames
// ============================================================================

fn character_entries(value: &Value) -> Names {
    match value {
        Value::Vector(v) => match v.data() {
            VectorData::Character(c) => Some(c.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Row and column names of a matrix
pub(crate) fn dimnames_pair(x: &Vector) -> (Names, Names) {
    match x.attr("dimnames") {
        Some(Value::Vector(list)) => match list.data() {
            VectorData::List(items) if items.len() == 2 => {
                (character_entries(&items[0]), character_entries(&items[1]))
            }
            _ => (None, None),
        },
        _ => (None, None),
    }
}

/// Set (or, when both are absent, remove) the row and column names
pub(crate) fn set_dimnames_pair(x: &mut Vector, rows: Names, cols: Names) {
    if rows.is_none() && cols.is_none() {
        x.remove_attr("dimnames");
        return;
    }
    let entry = |names: Names| names.map_or(Value::Null, |n| Value::Vector(Vector::character(n)));
    let list = Vector::list(vec![entry(rows), entry(cols)]);
    x.set_attr("dimnames", Value::Vector(list));
}

/// Validate and install a `dimnames` value
///
/// Entries are coerced to character; zero-length entries become `NULL`.
pub(crate) fn apply_dimnames(x: &mut Vector, value: &Value) -> RResult<()> {
    let list = match value {
        Value::Null => {
            x.remove_attr("dimnames");
            return Ok(());
        }
        Value::Vector(v) if v.kind() == Kind::List => v,
        _ => return Err(Message::DimnamesNotList.into()),
    };
    let dim = x.dim().ok_or(Message::DimnamesNonArray)?;
    if list.len() != dim.len() {
        return Err(Message::DimnamesLength(list.len(), dim.len()).into());
    }
    let VectorData::List(items) = list.data() else {
        return Ok(());
    };

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let entry = match item {
            Value::Null => Value::Null,
            Value::Vector(v) if v.is_empty() => Value::Null,
            Value::Vector(v) if v.kind().is_atomic() => {
                if v.len() != dim[i] {
                    return Err(Message::DimnamesExtent(i + 1).into());
                }
                let names = coerce::coerce(v, Kind::Character)?.vector;
                Value::Vector(Vector::new(names.into_data()))
            }
            _ => return Err(Message::DimnamesExtent(i + 1).into()),
        };
        entries.push(entry);
    }

    let mut out = Vector::list(entries);
    if let Some(names) = names_of(list) {
        out.set_names(Some(names));
    }
    x.set_attr("dimnames", Value::Vector(out));
    Ok(())
}

// ============================================================================
// Extents
// ============================================================================

/// A row or column count; `None` when the argument was not supplied
fn extent(interp: &mut Interpreter, value: Value, name: &'static str) -> RResult<Option<usize>> {
    if value.is_missing() {
        return Ok(None);
    }
    if !matches!(&value, Value::Vector(v) if v.kind().is_numeric()) {
        return Err(Message::NonNumericMatrixExtent.into());
    }
    let value = casts::Cast::new(name).as_double().apply(interp, value)?;
    match casts::to_double(&value) {
        Some(n) if n.is_nan() || n > i32::MAX as f64 => Err(Message::DimTooLargeOrNa(name.to_string()).into()),
        Some(n) if n < 0.0 => Err(Message::DimNegative(name.to_string()).into()),
        Some(n) => Ok(Some(n as usize)),
        None => Err(Message::DimTooLargeOrNa(name.to_string()).into()),
    }
}

fn ceil_div(a: usize, b: usize) -> usize {
    if b == 0 {
        0
    } else {
        (a + b - 1) / b
    }
}

// ============================================================================
// matrix
// ============================================================================

fn builtin_matrix(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let data = match args.get("data") {
        Value::Missing => Vector::logical(vec![None]),
        Value::Null => Vector::empty(Kind::Logical),
        Value::Vector(v) => v,
        other => return Err(Message::MatrixDataNotVector(other.type_name().to_string()).into()),
    };
    let byrow = casts::flag("byrow")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("byrow"))?;
    let byrow = to_bool(&byrow).unwrap_or(false);

    let len = data.len();
    let nrow = extent(interp, args.get("nrow"), "nrow")?;
    let ncol = extent(interp, args.get("ncol"), "ncol")?;
    let (nr, nc) = match (nrow, ncol) {
        (None, None) => (len, 1),
        (None, Some(nc)) => {
            if nc == 0 && len > 0 {
                return Err(Message::ZeroColumnsNonNullData.into());
            }
            (ceil_div(len, nc), nc)
        }
        (Some(nr), None) => (nr, ceil_div(len, nr)),
        (Some(nr), Some(nc)) => (nr, nc),
    };

    if len > 1 && (nr * nc) % len != 0 {
        if (len > nr && (len / nr) * nr != len) || (len < nr && (nr / len) * len != nr) {
            interp.warning(Message::MatrixDataRows(len, nr));
        } else if (len > nc && (len / nc) * nc != len) || (len < nc && (nc / len) * len != nc) {
            interp.warning(Message::MatrixDataColumns(len, nc));
        }
    }

    let total = nr * nc;
    let positions: Vec<Option<usize>> = if len == 0 {
        vec![None; total]
    } else if byrow {
        (0..total)
            .map(|k| {
                let (i, j) = (k % nr, k / nr);
                Some((i * nc + j) % len)
            })
            .collect()
    } else {
        (0..total).map(|k| Some(k % len)).collect()
    };

    let mut out = Vector::new(data.data().select(&positions));
    out.set_dim(&[nr, nc]);
    let dimnames = args.get("dimnames");
    if !dimnames.is_missing() {
        apply_dimnames(&mut out, &dimnames)?;
    }
    Ok(Value::Vector(out))
}

// ============================================================================
// diag
// ============================================================================

fn builtin_diag(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = args.get("x");
    let nrow_arg = args.get("nrow");
    let ncol_arg = args.get("ncol");

    if let Value::Vector(m) = &x {
        if let Some((r, c)) = m.matrix_dims() {
            if !nrow_arg.is_missing() || !ncol_arg.is_missing() {
                return Err(Message::DiagDimsWithMatrix.into());
            }
            let names = casts::flag("names")
                .default_if_missing(Value::lgl(true))
                .apply(interp, args.get("names"))?;
            return Ok(Value::Vector(diagonal_of(m, r, c, to_bool(&names).unwrap_or(true))));
        }
        if m.dim().map_or(false, |d| d.len() != 1) {
            return Err(Message::NotOneDimensional.into());
        }
    }

    let nrow = extent(interp, nrow_arg, "nrow")?;
    let ncol = extent(interp, ncol_arg, "ncol")?;

    let (values, n) = match x {
        Value::Missing => {
            let n = nrow.ok_or_else(|| Message::ArgumentMissing("nrow".to_string()))?;
            (Vector::double(vec![1.0]), n)
        }
        Value::Vector(v) if !(v.kind().is_numeric() || v.kind() == Kind::Complex) => {
            return Err(Message::InvalidArgument("x".to_string()).into());
        }
        Value::Vector(v) if v.len() == 1 && nrow.is_none() && ncol.is_none() => {
            let n = extent(interp, Value::Vector(v), "nrow")?.unwrap_or(0);
            (Vector::double(vec![1.0]), n)
        }
        Value::Vector(v) => {
            let n = v.len();
            (v, n)
        }
        Value::Null => return Err(Message::MustHavePositiveLength("x".to_string()).into()),
        other => return Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
    };
    let nr = nrow.unwrap_or(n);
    let nc = ncol.unwrap_or(nr);
    Ok(Value::Vector(diagonal_matrix(&values, nr, nc)?))
}

/// `x` recycled along the diagonal of an `nr` by `nc` zero matrix
fn diagonal_matrix(values: &Vector, nr: usize, nc: usize) -> RResult<Vector> {
    let m = nr.min(nc);
    if m > 0 && values.is_empty() {
        return Err(Message::MustHavePositiveLength("x".to_string()).into());
    }
    let kind = match values.kind() {
        Kind::Logical | Kind::Integer | Kind::Complex => values.kind(),
        _ => Kind::Double,
    };
    let values = coerce::coerce(values, kind)?.vector;
    let mut data = zeros(kind, nr * nc);
    for i in 0..m {
        assign_element(&mut data, i * nr + i, values.data(), i % values.len());
    }
    let mut out = Vector::new(data);
    out.set_dim(&[nr, nc]);
    Ok(out)
}

fn zeros(kind: Kind, n: usize) -> VectorData {
    match kind {
        Kind::Logical => VectorData::Logical(vec![Some(false); n]),
        Kind::Integer => VectorData::Integer(vec![0; n]),
        Kind::Complex => VectorData::Complex(vec![num::complex::Complex64::new(0.0, 0.0); n]),
        _ => VectorData::Double(vec![0.0; n]),
    }
}

/// Diagonal of a matrix; named when row and column names agree on it
fn diagonal_of(m: &Vector, nr: usize, nc: usize, names: bool) -> Vector {
    let len = nr.min(nc);
    let positions: Vec<usize> = (0..len).map(|i| i * (nr + 1)).collect();
    let mut out = Vector::new(m.data().take(&positions));
    if names {
        if let (Some(rows), Some(cols)) = dimnames_pair(m) {
            if rows.len() >= len && cols.len() >= len && rows[..len] == cols[..len] {
                out.set_names(Some(rows[..len].to_vec()));
            }
        }
    }
    out
}

fn builtin_diag_assign(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match args.get("x") {
        Value::Vector(v) => v,
        _ => return Err(Message::OnlyMatrixDiagonals.into()),
    };
    let (nr, nc) = x.matrix_dims().ok_or(Message::OnlyMatrixDiagonals)?;
    let value = match args.get("value") {
        Value::Vector(v) => v,
        Value::Null => Vector::empty(Kind::Logical),
        _ => return Err(Message::ReplacementDiagonalLength.into()),
    };
    let len = nr.min(nc);
    if value.len() != 1 && value.len() != len {
        return Err(Message::ReplacementDiagonalLength.into());
    }
    if len == 0 {
        return Ok(Value::Vector(x));
    }

    let kind = common_kind([x.kind(), value.kind()]).unwrap_or(Kind::Logical);
    let attributes = x.attributes().cloned();
    let mut data = interp.coerce(&x, kind)?.into_data();
    let value = interp.coerce(&value, kind)?;
    for i in 0..len {
        assign_element(&mut data, i * (nr + 1), value.data(), i % value.len());
    }
    let mut out = Vector::new(data);
    out.set_attributes(attributes);
    Ok(Value::Vector(out))
}

// ============================================================================
// Transpose
// ============================================================================

pub(crate) fn transpose(x: &Vector) -> RResult<Vector> {
    let (nr, nc, rows, cols) = match x.dim() {
        None => (x.len(), 1, names_of(x), None),
        Some(d) if d.len() == 1 => (d[0], 1, names_of(x).or_else(|| dimnames_pair(x).0), None),
        Some(d) if d.len() == 2 => {
            let (rows, cols) = dimnames_pair(x);
            (d[0], d[1], rows, cols)
        }
        Some(_) => return Err(Message::ArgumentNotMatrix.into()),
    };

    let positions: Vec<usize> = (0..nr * nc)
        .map(|k| {
            // element (i, j) of the result is (j, i) of x
            let (i, j) = (k % nc, k / nc);
            i * nr + j
        })
        .collect();
    let mut out = Vector::new(x.data().take(&positions));
    if let Some(attributes) = x.attributes() {
        for (name, value) in attributes.iter() {
            if !matches!(name, "names" | "dim" | "dimnames") {
                out.set_attr(name, value.clone());
            }
        }
    }
    out.set_dim(&[nc, nr]);
    set_dimnames_pair(&mut out, cols, rows);
    Ok(out)
}

fn builtin_t(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("x") {
        Value::Vector(x) => Ok(Value::Vector(transpose(&x)?)),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => Err(Message::ArgumentNotMatrix.into()),
    }
}
