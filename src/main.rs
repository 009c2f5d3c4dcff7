use social_media::app;
use social_media::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    app::run().await
}
