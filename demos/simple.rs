use bytes::Bytes;
use media_uploader::{
    plugins::{metadata_plugin, retry_plugin, validation_plugin, MetadataOptions, RetryOptions, ValidationOptions, UploadAnalytics},
    prelude::*,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up MEDIA_PROVIDER and the provider credentials from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let analytics = UploadAnalytics::new();
    let uploader = UploaderBuilder::new()
        .with_config(ProviderConfig::from_env()?)
        .with_plugin(validation_plugin(
            ValidationOptions::builder()
                .max_size(10 * 1024 * 1024)
                .allowed_types(vec!["image/*".to_string(), "text/plain".to_string()])
                .build(),
        ))
        .with_plugin(metadata_plugin(MetadataOptions::default().with_field("app", "simple-demo")))
        .with_plugin(retry_plugin(RetryOptions::default()))
        .with_plugin(analytics.plugin())
        .build()
        .await?;

    println!("Provider: {}", uploader.provider_name());
    println!("Supports resize: {}", uploader.supports("transformations.resize"));

    let file = FileInput::File(
        FileHandle::new(Bytes::from_static(b"Hello, media!"))
            .with_name("hello.txt")
            .with_content_type("text/plain"),
    );
    let options = UploadOptions::builder()
        .folder("demo")
        .build()
        .with_progress(|percent| println!("  progress: {:.0}%", percent));

    let uploaded = uploader.upload(file, options).await?;
    println!("Uploaded {} ({} bytes) to {}", uploaded.id, uploaded.size, uploaded.url);
    println!("Metadata: {}", serde_json::to_string_pretty(&uploaded.metadata)?);

    let fetched = uploader.get(&uploaded.id).await?;
    println!("Fetched {} with format {:?}", fetched.id, fetched.format);

    match uploader.search(SearchOptions::default().in_folder("demo")).await {
        Ok(found) => println!("Search found {} resources", found.total_count),
        Err(e) if e.kind() == ErrorKind::ProviderError => println!("Search: {}", e),
        Err(e) => return Err(e.into()),
    }

    uploader.delete(&uploaded.id).await?;
    println!("Deleted {}", uploaded.id);

    println!("Analytics: {}", serde_json::to_string(&analytics.snapshot())?);
    Ok(())
}
