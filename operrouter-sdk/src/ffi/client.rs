//! # FFI Client
//!
//! In-process client of the native core library.
//!
//! Each call encodes its arguments, then runs the native function on tokio's blocking
//! pool with a handle on the library, so the library cannot be unloaded while a call
//! is in flight. Replies are decoded while the guard of the returned pointer is alive;
//! the pointer is released when the guard drops.
use super::{
    FfiError,
    buffer::{OwnedCString, OwnedProtoBuffer, input_parts},
    library::{self, FfiBindings, JsonFn, NoArgFn, ProtoBindings, ProtoFn},
    proto,
};
use crate::{
    client::{
        ChatMessage, ConfigResponse, DataSourceConfig, DataSourceQueryResponse,
        DataSourceResponse, LlmChatResponse, LlmConfig, LlmEmbeddingResponse,
        LlmGenerateResponse, LlmResponse, Metadata, OperRouterClient, PingResponse, Row,
    },
    error::Error,
    wire::{
        ChatParams, CoreReply, CreateDataSourceParams, CreateLlmParams, InsertParams, NameParams,
        PromptParams, QueryParams, TextParams,
    },
};
use async_trait::async_trait;
use libloading::Library;
use prost::Message;
use serde::Serialize;
use std::{
    ffi::{CStr, CString},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, warn};

/// Client of the native core library.
#[derive(Debug, Clone)]
pub struct FfiClient {
    bindings: FfiBindings,
    library: Option<Arc<Library>>,
    path: Option<PathBuf>,
}

enum NativeCall {
    NoArg(NoArgFn),
    Json(JsonFn, CString),
}

impl FfiClient {
    /// Opens the core library and binds its entry points.
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit library path. When `None`, the library is searched through
    ///   `OPERROUTER_FFI_PATH`, the system search path and the in-repository build
    ///   directory, in that order.
    ///
    /// # Returns
    ///
    /// * `Ok(FfiClient)` - The loaded client.
    /// * `Err(FfiError)` - If no candidate loads or a required symbol is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, FfiError> {
        let (library, path) = library::open(path)?;

        // SAFETY: the opened library implements the OperRouter C ABI, and the bindings
        // are stored next to the `Arc` that keeps it loaded.
        let bindings = unsafe { FfiBindings::resolve(&library) }?;

        debug!(
            path = %path.display(),
            proto = bindings.proto.is_some(),
            "FFI client ready"
        );

        Ok(Self {
            bindings,
            library: Some(Arc::new(library)),
            path: Some(path),
        })
    }

    /// Builds a client over entry points that are already in the address space.
    ///
    /// # Safety
    ///
    /// Every function in `bindings` must follow the OperRouter C ABI and stay valid
    /// for the lifetime of the client: strings returned by the JSON entry points must
    /// be releasable by `free_string`, buffers returned by the protobuf entry points by
    /// `proto.free`.
    pub unsafe fn from_bindings(bindings: FfiBindings) -> Self {
        Self {
            bindings,
            library: None,
            path: None,
        }
    }

    /// Path of the loaded library, `None` for clients built from bindings.
    pub fn library_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the library exports the protobuf-buffer entry points.
    pub fn supports_proto(&self) -> bool {
        self.bindings.proto.is_some()
    }

    /// Version string of the native library.
    ///
    /// The string is static and owned by the library, so it is copied and never freed.
    pub fn version(&self) -> Result<String, FfiError> {
        const SYMBOL: &str = "operrouter_version";

        // SAFETY: the bindings contract guarantees a valid function.
        let ptr = unsafe { (self.bindings.version)() };
        if ptr.is_null() {
            return Err(FfiError::NullResponse { symbol: SYMBOL });
        }

        // SAFETY: a non-null return is a static NUL-terminated string.
        unsafe { CStr::from_ptr(ptr) }
            .to_str()
            .map(str::to_owned)
            .map_err(|source| FfiError::InvalidUtf8 {
                symbol: SYMBOL,
                source,
            })
    }

    async fn invoke(&self, symbol: &'static str, call: NativeCall) -> Result<CoreReply, FfiError> {
        let library = self.library.clone();
        let free = self.bindings.free_string;

        debug!(symbol, "calling FFI");

        tokio::task::spawn_blocking(move || {
            let _library = library;

            // SAFETY: the bindings contract guarantees valid functions; `arg` outlives
            // the call.
            let raw = unsafe {
                match call {
                    NativeCall::NoArg(f) => f(),
                    NativeCall::Json(f, ref arg) => f(arg.as_ptr()),
                }
            };

            // SAFETY: the returned string belongs to the library and is released by
            // `free_string`.
            let Some(reply) = (unsafe { OwnedCString::from_raw(raw, free) }) else {
                warn!(symbol, "FFI call returned a null pointer");
                return Err(FfiError::NullResponse { symbol });
            };

            let text = reply
                .to_str()
                .map_err(|source| FfiError::InvalidUtf8 { symbol, source })?;

            serde_json::from_str(text).map_err(|source| FfiError::Decode { symbol, source })
        })
        .await
        .map_err(|source| FfiError::Join { symbol, source })?
    }

    async fn call_no_arg(&self, symbol: &'static str, f: NoArgFn) -> Result<CoreReply, FfiError> {
        self.invoke(symbol, NativeCall::NoArg(f)).await
    }

    async fn call_raw(
        &self,
        symbol: &'static str,
        f: JsonFn,
        arg: &str,
    ) -> Result<CoreReply, FfiError> {
        let arg =
            CString::new(arg).map_err(|source| FfiError::InvalidArgument { symbol, source })?;
        self.invoke(symbol, NativeCall::Json(f, arg)).await
    }

    async fn call_json<P: Serialize>(
        &self,
        symbol: &'static str,
        f: JsonFn,
        params: &P,
    ) -> Result<CoreReply, FfiError> {
        let arg =
            serde_json::to_string(params).map_err(|source| FfiError::Encode { symbol, source })?;
        self.call_raw(symbol, f, &arg).await
    }

    fn proto_bindings(&self, symbol: &'static str) -> Result<ProtoBindings, FfiError> {
        self.bindings
            .proto
            .ok_or(FfiError::Unsupported { symbol })
    }

    async fn call_proto<Req, Res>(
        &self,
        symbol: &'static str,
        select: fn(&ProtoBindings) -> ProtoFn,
        request: &Req,
    ) -> Result<Res, FfiError>
    where
        Req: Message,
        Res: Message + Default + Send + 'static,
    {
        let bindings = self.proto_bindings(symbol)?;
        let f = select(&bindings);
        let free = bindings.free;
        let input = request.encode_to_vec();
        let library = self.library.clone();

        debug!(symbol, len = input.len(), "calling FFI (protobuf)");

        tokio::task::spawn_blocking(move || {
            let _library = library;
            let (ptr, len) = input_parts(&input);

            // SAFETY: `ptr` is non-null and valid for `len` bytes for the whole call.
            let raw = unsafe { f(ptr, len) };

            // SAFETY: the returned buffer belongs to the library and is released by
            // `proto_buffer_free`.
            let Some(reply) = (unsafe { OwnedProtoBuffer::from_raw(raw, free) }) else {
                warn!(symbol, "FFI call returned a null buffer");
                return Err(FfiError::NullResponse { symbol });
            };

            Res::decode(reply.as_bytes()).map_err(|source| FfiError::ProtoDecode { symbol, source })
        })
        .await
        .map_err(|source| FfiError::Join { symbol, source })?
    }

    /// Health check over the protobuf-buffer ABI.
    pub async fn ping_proto(&self) -> Result<proto::PingResponse, FfiError> {
        self.call_proto("ping_proto", |b| b.ping, &proto::PingRequest {})
            .await
    }

    /// Validates a TOML configuration over the protobuf-buffer ABI.
    pub async fn validate_config_proto(
        &self,
        toml_content: &str,
    ) -> Result<proto::ValidateConfigResponse, FfiError> {
        let request = proto::ValidateConfigRequest {
            toml_content: toml_content.to_string(),
        };
        self.call_proto("validate_config_proto", |b| b.validate_config, &request)
            .await
    }

    /// Reads the core metadata over the protobuf-buffer ABI.
    pub async fn get_metadata_proto(&self) -> Result<proto::GetMetadataResponse, FfiError> {
        self.call_proto(
            "get_metadata_proto",
            |b| b.get_metadata,
            &proto::GetMetadataRequest {},
        )
        .await
    }

    /// Loads a configuration file over the protobuf-buffer ABI.
    pub async fn load_config_proto(
        &self,
        config_path: &str,
    ) -> Result<proto::LoadConfigResponse, FfiError> {
        let request = proto::LoadConfigRequest {
            config_path: config_path.to_string(),
        };
        self.call_proto("load_config_proto", |b| b.load_config, &request)
            .await
    }
}

#[async_trait]
impl OperRouterClient for FfiClient {
    async fn ping(&self) -> Result<PingResponse, Error> {
        let reply = self
            .call_no_arg("operrouter_ping", self.bindings.ping)
            .await?;
        Ok(reply.into_ping())
    }

    async fn validate_config(&self, config: &serde_json::Value) -> Result<ConfigResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_validate_config",
                self.bindings.validate_config,
                config,
            )
            .await?;
        Ok(reply.into_config())
    }

    async fn load_config(&self, path: &str) -> Result<ConfigResponse, Error> {
        let reply = self
            .call_raw("operrouter_load_config", self.bindings.load_config, path)
            .await?;
        Ok(reply.into_config())
    }

    async fn get_metadata(&self) -> Result<Metadata, Error> {
        let reply = self
            .call_raw("operrouter_get_metadata", self.bindings.get_metadata, "{}")
            .await?;
        Ok(reply.into_metadata())
    }

    async fn create_datasource(
        &self,
        name: &str,
        config: &DataSourceConfig,
    ) -> Result<DataSourceResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_datasource_create",
                self.bindings.datasource_create,
                &CreateDataSourceParams { name, config },
            )
            .await?;
        Ok(reply.into_datasource())
    }

    async fn query_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceQueryResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_datasource_query",
                self.bindings.datasource_query,
                &QueryParams { name, query },
            )
            .await?;
        Ok(reply.into_query())
    }

    async fn execute_datasource(
        &self,
        name: &str,
        query: &str,
    ) -> Result<DataSourceResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_datasource_execute",
                self.bindings.datasource_execute,
                &QueryParams { name, query },
            )
            .await?;
        Ok(reply.into_datasource())
    }

    async fn insert_datasource(&self, name: &str, row: &Row) -> Result<DataSourceResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_datasource_insert",
                self.bindings.datasource_insert,
                &InsertParams { name, data: row },
            )
            .await?;
        Ok(reply.into_datasource())
    }

    async fn ping_datasource(&self, name: &str) -> Result<DataSourceResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_datasource_ping",
                self.bindings.datasource_ping,
                &NameParams { name },
            )
            .await?;
        Ok(reply.into_datasource_health())
    }

    async fn close_datasource(&self, name: &str) -> Result<DataSourceResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_datasource_close",
                self.bindings.datasource_close,
                &NameParams { name },
            )
            .await?;
        Ok(reply.into_datasource())
    }

    async fn create_llm(&self, name: &str, config: &LlmConfig) -> Result<LlmResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_llm_create",
                self.bindings.llm_create,
                &CreateLlmParams { name, config },
            )
            .await?;
        Ok(reply.into_llm())
    }

    async fn generate_llm(&self, name: &str, prompt: &str) -> Result<LlmGenerateResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_llm_generate",
                self.bindings.llm_generate,
                &PromptParams { name, prompt },
            )
            .await?;
        Ok(reply.into_generate())
    }

    async fn chat_llm(
        &self,
        name: &str,
        messages: &[ChatMessage],
    ) -> Result<LlmChatResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_llm_chat",
                self.bindings.llm_chat,
                &ChatParams { name, messages },
            )
            .await?;
        Ok(reply.into_chat())
    }

    async fn embedding_llm(&self, name: &str, text: &str) -> Result<LlmEmbeddingResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_llm_embedding",
                self.bindings.llm_embedding,
                &TextParams { name, text },
            )
            .await?;
        Ok(reply.into_embedding())
    }

    async fn ping_llm(&self, name: &str) -> Result<LlmResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_llm_ping",
                self.bindings.llm_ping,
                &NameParams { name },
            )
            .await?;
        Ok(reply.into_llm_health())
    }

    async fn close_llm(&self, name: &str) -> Result<LlmResponse, Error> {
        let reply = self
            .call_json(
                "operrouter_llm_close",
                self.bindings.llm_close,
                &NameParams { name },
            )
            .await?;
        Ok(reply.into_llm())
    }
}
