#[actix_web::main]
async fn main() -> std::io::Result<()> {
    nlsql::app::run().await
}
