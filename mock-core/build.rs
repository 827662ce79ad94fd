use std::io::Result;

fn main() -> Result<()> {
    // The service definition is shared with the SDK
    let proto_files = &["../operrouter-sdk/proto/operrouter.proto"];
    let proto_folder = "../operrouter-sdk/proto";

    tonic_prost_build::configure()
        .protoc_arg("--experimental_allow_proto3_optional")
        .build_client(false)
        .compile_protos(proto_files, &[proto_folder])?;

    println!("cargo:rerun-if-changed=../operrouter-sdk/proto/operrouter.proto");

    Ok(())
}
