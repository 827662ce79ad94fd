use std::io::Result;

fn main() -> Result<()> {
    let proto_files = &[
        // gRPC service
        "proto/operrouter.proto",
        // Messages for the `*_proto` native entry points
        "proto/operrouter_ffi.proto",
    ];

    let proto_folder = "proto";

    for file in proto_files {
        println!("cargo:rerun-if-changed={file}");
    }

    tonic_prost_build::configure()
        .protoc_arg("--experimental_allow_proto3_optional")
        .build_server(false)
        .build_client(true)
        .compile_protos(proto_files, &[proto_folder])
}
