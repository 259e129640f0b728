//! Generates the `VideoService` client and server glue.
//!
//! Message types are declared by hand with `prost` derives in
//! `src/adapters/grpc/proto.rs`, so no `protoc` is needed at build time.

fn main() {
    let stream_video = tonic_build::manual::Method::builder()
        .name("stream_video")
        .route_name("StreamVideo")
        .input_type("crate::adapters::grpc::proto::StreamVideoRequest")
        .output_type("crate::adapters::grpc::proto::VideoChunk")
        .codec_path("tonic::codec::ProstCodec")
        .server_streaming()
        .build();

    let service = tonic_build::manual::Service::builder()
        .name("VideoService")
        .package("video")
        .method(stream_video)
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}
