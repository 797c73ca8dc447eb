fn main() {
    println!("cargo:rerun-if-changed=proto/transit.proto");
    prost_build::compile_protos(&["proto/transit.proto"], &["proto/"])
        .expect("failed to compile proto/transit.proto");
}
