#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pdfrender::run().await
}
