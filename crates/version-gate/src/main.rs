#[tokio::main]
async fn main() {
    version_gate::start(std::env::args()).await;
}
