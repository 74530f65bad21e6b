fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tfplugin_proto = "../../proto/tfplugin6.proto";
    let proto_dir = "../../proto";

    println!("cargo:rerun-if-changed={}", tfplugin_proto);

    // Terraform drives the provider, so only the server half is generated.
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile(&[tfplugin_proto], &[proto_dir])?;

    Ok(())
}
