//! # Library Discovery and Symbol Binding
//!
//! Finds the native core library, opens it, and resolves every entry point into a
//! plain table of function pointers ([`FfiBindings`]).
//!
//! Candidates are tried in order:
//!
//! 1. The explicit path given by the caller.
//! 2. The `OPERROUTER_FFI_PATH` environment variable.
//! 3. The platform default filename, resolved through the system search path.
//! 4. The same filename under `bridges/operrouter-core-ffi/target/release`, next to
//!    this crate's sources.
use super::{FfiError, buffer::ProtoBuffer};
use libloading::Library;
use std::{
    ffi::{OsString, c_char},
    path::{Path, PathBuf},
};
use tracing::debug;

pub const ENV_LIBRARY_PATH: &str = "OPERROUTER_FFI_PATH";

/// Base name of the library; the platform prefix and extension are added on lookup.
pub const LIBRARY_NAME: &str = "operrouter_core_ffi";

pub type VersionFn = unsafe extern "C" fn() -> *const c_char;
pub type NoArgFn = unsafe extern "C" fn() -> *mut c_char;
pub type JsonFn = unsafe extern "C" fn(*const c_char) -> *mut c_char;
pub type FreeStringFn = unsafe extern "C" fn(*mut c_char);
pub type ProtoFn = unsafe extern "C" fn(*const u8, usize) -> ProtoBuffer;
pub type ProtoFreeFn = unsafe extern "C" fn(ProtoBuffer);

/// Entry points of the JSON-string ABI.
#[derive(Debug, Clone, Copy)]
pub struct FfiBindings {
    pub version: VersionFn,
    pub ping: NoArgFn,
    pub validate_config: JsonFn,
    pub load_config: JsonFn,
    pub get_metadata: JsonFn,
    pub datasource_create: JsonFn,
    pub datasource_query: JsonFn,
    pub datasource_execute: JsonFn,
    pub datasource_insert: JsonFn,
    pub datasource_ping: JsonFn,
    pub datasource_close: JsonFn,
    pub llm_create: JsonFn,
    pub llm_generate: JsonFn,
    pub llm_chat: JsonFn,
    pub llm_embedding: JsonFn,
    pub llm_ping: JsonFn,
    pub llm_close: JsonFn,
    pub free_string: FreeStringFn,
    /// Protobuf-buffer entry points, `None` when the library does not export them.
    pub proto: Option<ProtoBindings>,
}

/// Entry points of the protobuf-buffer ABI.
#[derive(Debug, Clone, Copy)]
pub struct ProtoBindings {
    pub ping: ProtoFn,
    pub validate_config: ProtoFn,
    pub get_metadata: ProtoFn,
    pub load_config: ProtoFn,
    pub free: ProtoFreeFn,
}

/// Platform file name of the library (`liboperrouter_core_ffi.so` on Linux).
pub fn library_filename() -> OsString {
    libloading::library_filename(LIBRARY_NAME)
}

/// Ordered list of paths to try when opening the library.
///
/// # Arguments
///
/// * `explicit` - Path given by the caller, tried first.
/// * `env_override` - Value of `OPERROUTER_FFI_PATH`, if set.
pub fn library_candidates(explicit: Option<&Path>, env_override: Option<OsString>) -> Vec<PathBuf> {
    let filename = library_filename();
    let bundled = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("bridges")
        .join("operrouter-core-ffi")
        .join("target")
        .join("release")
        .join(&filename);

    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_override.filter(|v| !v.is_empty()).map(PathBuf::from))
        .chain([PathBuf::from(filename), bundled])
        .collect()
}

/// Opens the first candidate that loads.
pub(crate) fn open(explicit: Option<&Path>) -> Result<(Library, PathBuf), FfiError> {
    let tried = library_candidates(explicit, std::env::var_os(ENV_LIBRARY_PATH));
    let mut reason = String::from("no candidate");

    for candidate in &tried {
        // SAFETY: loading runs the library's initializers; the core library has none
        // with preconditions on the host process.
        match unsafe { Library::new(candidate) } {
            Ok(library) => {
                debug!(path = %candidate.display(), "loaded FFI library");
                return Ok((library, candidate.clone()));
            }
            Err(e) => {
                debug!(path = %candidate.display(), error = %e, "FFI library candidate rejected");
                reason = e.to_string();
            }
        }
    }

    Err(FfiError::LibraryNotFound { tried, reason })
}

/// Resolves `name` to a function pointer of type `T`.
///
/// # Safety
///
/// `T` must match the native signature of the symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, FfiError> {
    // SAFETY: forwarded to the caller.
    let sym = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|source| FfiError::MissingSymbol { symbol: name, source })?;
    Ok(*sym)
}

impl FfiBindings {
    /// Resolves every entry point from an opened library.
    ///
    /// The JSON-string symbols are required; the protobuf-buffer symbols are bound
    /// all together or not at all.
    ///
    /// # Safety
    ///
    /// The library must implement the OperRouter C ABI. The returned pointers are only
    /// valid while `library` stays loaded.
    pub(crate) unsafe fn resolve(library: &Library) -> Result<Self, FfiError> {
        // SAFETY: the signatures below are those of the OperRouter C ABI.
        unsafe {
            Ok(Self {
                version: symbol(library, "operrouter_version")?,
                ping: symbol(library, "operrouter_ping")?,
                validate_config: symbol(library, "operrouter_validate_config")?,
                load_config: symbol(library, "operrouter_load_config")?,
                get_metadata: symbol(library, "operrouter_get_metadata")?,
                datasource_create: symbol(library, "operrouter_datasource_create")?,
                datasource_query: symbol(library, "operrouter_datasource_query")?,
                datasource_execute: symbol(library, "operrouter_datasource_execute")?,
                datasource_insert: symbol(library, "operrouter_datasource_insert")?,
                datasource_ping: symbol(library, "operrouter_datasource_ping")?,
                datasource_close: symbol(library, "operrouter_datasource_close")?,
                llm_create: symbol(library, "operrouter_llm_create")?,
                llm_generate: symbol(library, "operrouter_llm_generate")?,
                llm_chat: symbol(library, "operrouter_llm_chat")?,
                llm_embedding: symbol(library, "operrouter_llm_embedding")?,
                llm_ping: symbol(library, "operrouter_llm_ping")?,
                llm_close: symbol(library, "operrouter_llm_close")?,
                free_string: symbol(library, "operrouter_free_string")?,
                proto: ProtoBindings::resolve(library),
            })
        }
    }
}

impl ProtoBindings {
    unsafe fn resolve(library: &Library) -> Option<Self> {
        let bind = || -> Result<Self, FfiError> {
            // SAFETY: the signatures below are those of the OperRouter C ABI.
            unsafe {
                Ok(Self {
                    ping: symbol(library, "ping_proto")?,
                    validate_config: symbol(library, "validate_config_proto")?,
                    get_metadata: symbol(library, "get_metadata_proto")?,
                    load_config: symbol(library, "load_config_proto")?,
                    free: symbol(library, "proto_buffer_free")?,
                })
            }
        };

        bind()
            .inspect_err(|e| debug!(error = %e, "protobuf FFI entry points unavailable"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_discovery_order() {
        let candidates = library_candidates(
            Some(Path::new("/opt/core/libcore.so")),
            Some(OsString::from("/env/libcore.so")),
        );

        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], PathBuf::from("/opt/core/libcore.so"));
        assert_eq!(candidates[1], PathBuf::from("/env/libcore.so"));
        assert_eq!(candidates[2], PathBuf::from(library_filename()));
        assert!(candidates[3].ends_with(
            Path::new("bridges/operrouter-core-ffi/target/release").join(library_filename())
        ));
    }

    #[test]
    fn missing_overrides_are_skipped() {
        let candidates = library_candidates(None, None);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], PathBuf::from(library_filename()));

        let candidates = library_candidates(None, Some(OsString::new()));
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn filename_carries_the_platform_affixes() {
        let filename = library_filename().to_string_lossy().into_owned();
        assert!(filename.contains(LIBRARY_NAME));

        if cfg!(target_os = "linux") {
            assert_eq!(filename, "liboperrouter_core_ffi.so");
        }
    }

    #[test]
    fn unloadable_library_lists_candidates_and_remedy() {
        let missing = Path::new("/definitely/not/here/libcore.so");

        let Err(err) = open(Some(missing)) else {
            panic!("a missing library must not load");
        };

        let message = err.to_string();
        assert!(message.contains("/definitely/not/here/libcore.so"));
        assert!(message.contains(ENV_LIBRARY_PATH));
        assert!(matches!(err, FfiError::LibraryNotFound { .. }));
    }
}
