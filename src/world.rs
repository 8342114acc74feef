//! The program index: every method of the analysed program, keyed by its
//! signature string.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::frontend;
use crate::language::CppMethod;

static THE_WORLD: OnceLock<World> = OnceLock::new();

/// An error building or accessing the program index.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// [`World::get`] before [`World::initialize`].
    #[error("the world is not initialized")]
    NotInitialized,
    /// A second [`World::initialize`] in the same process.
    #[error("the world is already initialized")]
    AlreadyInitialized,
    /// Two definitions of `main` in the program.
    #[error("duplicate definition of the main function (second one in {file})")]
    DuplicateMain {
        /// The file containing the second definition.
        file: PathBuf,
    },
    /// A source file or directory that cannot be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The unreadable path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Options handed to the front end.
#[derive(Debug, Clone, Default)]
pub struct WorldOptions {
    /// An include directory for the front end. The bundled front end does
    /// not expand preprocessor directives and ignores it.
    pub include_dir: Option<PathBuf>,
    /// The language standard, e.g. `c11`. The bundled front end ignores it.
    pub standard: Option<String>,
}

/// The program index: a map from method signature to method, plus the
/// distinguished `main` method. Immutable once built.
#[derive(Debug)]
pub struct World {
    methods: BTreeMap<String, CppMethod>,
    main: Option<String>,
}

impl World {
    /// Builds a world from every `.c`, `.cc`, `.cpp`, and `.cxx` file under
    /// a directory, scanned recursively.
    ///
    /// Translation units the front end reports a diagnostic for are logged
    /// and skipped; they do not fail the build.
    ///
    /// # Errors
    /// - [`WorldError::Io`] when the directory or a source file cannot be
    ///   read.
    /// - [`WorldError::DuplicateMain`] when two `main` definitions are
    ///   indexed.
    pub fn build(source_dir: impl AsRef<Path>, options: &WorldOptions) -> Result<Self, WorldError> {
        let sources = load_source_codes(source_dir.as_ref())?;
        Self::from_sources(sources, options)
    }

    /// Builds a world from in-memory sources: `(file name, content)` pairs.
    ///
    /// # Errors
    /// - [`WorldError::DuplicateMain`] when two `main` definitions are
    ///   indexed.
    pub fn from_sources(
        sources: impl IntoIterator<Item = (PathBuf, String)>,
        options: &WorldOptions,
    ) -> Result<Self, WorldError> {
        if let Some(include_dir) = &options.include_dir {
            debug!(include_dir = %include_dir.display(), "include directory recorded");
        }
        if let Some(standard) = &options.standard {
            debug!(%standard, "language standard recorded");
        }
        info!("building the function list");
        let mut methods: BTreeMap<String, CppMethod> = BTreeMap::new();
        let mut main = None;
        for (file, content) in sources {
            let unit = match frontend::parse_translation_unit(&content) {
                Ok(unit) => unit,
                Err(diagnostic) => {
                    // A bad translation unit costs its own methods only.
                    warn!(file = %file.display(), %diagnostic, "skipping translation unit");
                    continue;
                }
            };
            for function in unit.functions {
                let method = CppMethod::new(file.clone(), function);
                let signature = method.signature().to_string();
                debug!(%signature, "indexing function");
                if methods.contains_key(&signature) {
                    warn!(%signature, "found another definition; this one is ignored");
                    continue;
                }
                if method.name() == "main" {
                    if main.is_some() {
                        return Err(WorldError::DuplicateMain { file });
                    }
                    main = Some(signature.clone());
                }
                methods.insert(signature, method);
            }
        }
        info!(count = methods.len(), "function list built");
        Ok(Self { methods, main })
    }

    /// Builds the process-wide world.
    ///
    /// # Errors
    /// Everything [`World::build`] reports, plus
    /// [`WorldError::AlreadyInitialized`] when a world already exists.
    /// Hosts that need more than one index per process should use
    /// [`World::build`] and pass the world around instead.
    pub fn initialize(
        source_dir: impl AsRef<Path>,
        options: &WorldOptions,
    ) -> Result<(), WorldError> {
        let world = Self::build(source_dir, options)?;
        THE_WORLD
            .set(world)
            .map_err(|_| WorldError::AlreadyInitialized)
    }

    /// The process-wide world.
    ///
    /// # Errors
    /// [`WorldError::NotInitialized`] before [`World::initialize`].
    pub fn get() -> Result<&'static Self, WorldError> {
        THE_WORLD.get().ok_or(WorldError::NotInitialized)
    }

    /// Iterates over every indexed method, in signature order.
    pub fn methods(&self) -> impl Iterator<Item = &CppMethod> {
        self.methods.values()
    }

    /// Looks a method up by its signature string.
    #[must_use]
    pub fn method_by_signature(&self, signature: &str) -> Option<&CppMethod> {
        self.methods.get(signature)
    }

    /// The `main` method, when the program has one.
    #[must_use]
    pub fn main_method(&self) -> Option<&CppMethod> {
        self.main.as_deref().and_then(|sig| self.methods.get(sig))
    }
}

/// Collects C/C++ sources recursively from a directory: a map from relative
/// file name to content.
///
/// # Errors
/// [`WorldError::Io`] when the directory walk or a file read fails.
pub fn load_source_codes(source_dir: &Path) -> Result<Vec<(PathBuf, String)>, WorldError> {
    info!(dir = %source_dir.display(), "loading source code");
    let mut sources = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| WorldError::Io {
            path: source_dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "c" | "cc" | "cpp" | "cxx"));
        if !is_source {
            continue;
        }
        debug!(file = %path.display(), "processing");
        let mut content = String::new();
        std::fs::File::open(path)
            .and_then(|mut file| file.read_to_string(&mut content))
            .map_err(|source| WorldError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let relative = path
            .strip_prefix(source_dir)
            .unwrap_or(path)
            .to_path_buf();
        sources.push((relative, content));
    }
    info!(count = sources.len(), "source loading finished");
    Ok(sources)
}
