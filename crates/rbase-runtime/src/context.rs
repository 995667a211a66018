//! Process-wide interpreter state
//!
//! Everything a builtin may read or write beyond its arguments lives here and
//! is passed explicitly: the options registry, the RNG state, collected
//! warnings, the visibility flag, the console and the session temp dir.

use crate::env::Environment;
use crate::error::{Message, RError, RResult, RWarning};
use crate::options::Options;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rbase_config::Config;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default cap on collected warnings when `nwarnings` is unusable
const DEFAULT_NWARNINGS: usize = 50;

/// Random number generator state
///
/// Builtins fetch the generator, draw from it and store it back, so a seed
/// fully determines every later stream.
#[derive(Default)]
pub struct RngState {
    rng: Option<StdRng>,
}

impl RngState {
    /// Reseed deterministically
    pub fn set_seed(&mut self, seed: i64) {
        debug!(seed, "seeding RNG");
        self.rng = Some(StdRng::seed_from_u64(seed as u64));
    }

    /// Take the generator, seeding from entropy on first use
    pub fn fetch(&mut self) -> StdRng {
        match self.rng.take() {
            Some(rng) => rng,
            None => {
                let seed: u64 = rand::rng().random();
                debug!(seed, "seeding RNG from entropy");
                StdRng::seed_from_u64(seed)
            }
        }
    }

    /// Forget the seed; the next draw seeds from entropy
    pub fn reset(&mut self) {
        debug!("RNG reset");
        self.rng = None;
    }

    pub fn store(&mut self, rng: StdRng) {
        self.rng = Some(rng);
    }

    pub fn is_seeded(&self) -> bool {
        self.rng.is_some()
    }
}

impl fmt::Debug for RngState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RngState").field("seeded", &self.is_seeded()).finish()
    }
}

/// Interpreter-wide state
pub struct Context {
    pub options: Options,
    pub rng: RngState,
    /// Whether the last top-level value should be printed
    pub visible: bool,
    warnings: Vec<RWarning>,
    console: Box<dyn Write>,
    temp_dir: Option<PathBuf>,
    tmp_parent: Option<PathBuf>,
    global: Environment,
    base: Environment,
    empty: Environment,
}

impl Context {
    pub fn new() -> Self {
        let empty = Environment::empty();
        let base = Environment::named("base", Some(empty.clone()));
        let global = Environment::named("R_GlobalEnv", Some(base.clone()));
        Self {
            options: Options::defaults(),
            rng: RngState::default(),
            visible: true,
            warnings: Vec::new(),
            console: Box::new(io::stdout()),
            temp_dir: None,
            tmp_parent: None,
            global,
            base,
            empty,
        }
    }

    /// Context seeded from configuration
    pub fn with_config(config: &Config) -> Self {
        let mut ctx = Self::new();
        ctx.options.apply_config(config);
        if let Some(seed) = config.settings.seed() {
            ctx.rng.set_seed(seed);
        }
        ctx.tmp_parent = config.settings.tmpdir().map(Path::to_path_buf);
        ctx
    }

    // === Environments ===

    pub fn global(&self) -> &Environment {
        &self.global
    }

    pub fn base(&self) -> &Environment {
        &self.base
    }

    pub fn empty(&self) -> &Environment {
        &self.empty
    }

    /// Global environment, attached environments, then base
    pub fn search_path(&self) -> Vec<Environment> {
        let mut path = vec![self.global.clone()];
        let mut current = self.global.parent();
        while let Some(env) = current {
            if env.ptr_eq(&self.empty) {
                break;
            }
            current = env.parent();
            path.push(env);
        }
        path
    }

    // === Warnings ===

    /// Record a warning, keeping at most `nwarnings`
    pub fn push_warning(&mut self, warning: RWarning) {
        warn!(call = warning.call.as_deref().unwrap_or(""), "{}", warning.message);
        let cap = self
            .options
            .int("nwarnings")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_NWARNINGS);
        if self.warnings.len() < cap {
            self.warnings.push(warning);
        }
    }

    pub fn warnings(&self) -> &[RWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<RWarning> {
        std::mem::take(&mut self.warnings)
    }

    // === Console ===

    pub fn set_console(&mut self, console: Box<dyn Write>) {
        self.console = console;
    }

    pub fn console(&mut self) -> &mut dyn Write {
        self.console.as_mut()
    }

    // === Temp dir ===

    /// Per-session temp dir, created on first use
    pub fn temp_dir(&mut self) -> RResult<PathBuf> {
        if let Some(dir) = &self.temp_dir {
            return Ok(dir.clone());
        }
        let parent = match &self.tmp_parent {
            Some(parent) => parent.clone(),
            None => std::env::var_os("TMPDIR")
                .map(PathBuf::from)
                .filter(|p| p.is_dir())
                .unwrap_or_else(std::env::temp_dir),
        };
        for _ in 0..100 {
            let suffix: u32 = rand::rng().random();
            let candidate = parent.join(format!("Rtmp{:06x}", suffix & 0xff_ffff));
            if fs::create_dir(&candidate).is_ok() {
                debug!(path = %candidate.display(), "created session temp dir");
                self.temp_dir = Some(candidate.clone());
                return Ok(candidate);
            }
        }
        Err(RError::new(Message::CannotCreateTempDir))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Some(dir) = self.temp_dir.take() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}
