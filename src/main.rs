#[tokio::main]
async fn main() {
    placebook::start_server().await;
}
