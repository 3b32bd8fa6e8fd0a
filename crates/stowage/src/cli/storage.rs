//! Storage command handlers.

use super::commands::Commands;
use std::path::Path;
use stowage::{ATTR_CONTENT_TYPE, ATTR_FILE_NAME, StorageObject, StorageService, StowageResult};
use stowage_error::{StorageError, StorageErrorKind};
use tokio::io::AsyncWriteExt;

/// Handle a storage command against `service`.
pub async fn handle_command(service: &StorageService, cmd: Commands) -> StowageResult<()> {
    match cmd {
        Commands::Put {
            file,
            key,
            name,
            layout,
            content_type,
            attributes,
        } => {
            let key = key.unwrap_or_else(|| service.new_key(name.as_deref(), layout));
            put_file(service, &key, &file, content_type, attributes).await
        }

        Commands::Get { key, output } => get_object(service, &key, output.as_deref()).await,

        Commands::Remove { key } => {
            let removed = service.remove(&key).await?;
            tracing::debug!(key = %key, returned = removed.is_some(), "Remove finished");
            println!("{}", key);
            Ok(())
        }

        Commands::Url { key } => {
            match service.get_url(&key).await? {
                Some(url) => println!("{}", url),
                None => eprintln!("The {} backend serves no public URLs", service.backend_name()),
            }
            Ok(())
        }

        Commands::NewKey { name, layout } => {
            println!("{}", service.new_key(name.as_deref(), layout));
            Ok(())
        }
    }
}

/// Store `file` under `key` and print the key.
async fn put_file(
    service: &StorageService,
    key: &str,
    file: &Path,
    content_type: Option<String>,
    attributes: Vec<(String, String)>,
) -> StowageResult<()> {
    let mut object = StorageObject::from_file(key, file)?;
    if let Some(name) = file.file_name() {
        object.set_attribute(ATTR_FILE_NAME, name.to_string_lossy());
    }
    if let Some(content_type) = content_type {
        object.set_attribute(ATTR_CONTENT_TYPE, content_type);
    }
    for (name, value) in attributes {
        object.set_attribute(name, value);
    }

    service.save(&object).await?;
    tracing::info!(key, backend = service.backend_name(), "Stored file");
    println!("{}", key);
    Ok(())
}

/// Copy the object under `key` to `output`, or to stdout.
async fn get_object(service: &StorageService, key: &str, output: Option<&Path>) -> StowageResult<()> {
    let object = service.get(key).await?.ok_or_else(|| {
        StorageError::new(StorageErrorKind::NotFound(format!("no object stored under {}", key)))
    })?;
    let mut reader = object.as_reader().await?;

    match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .map_err(|e| write_error(path, e))?;
            tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|e| write_error(path, e))?;
            file.flush().await.map_err(|e| write_error(path, e))?;
            tracing::info!(key, path = %path.display(), "Fetched object");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout)
                .await
                .map_err(|e| write_error(Path::new("<stdout>"), e))?;
            stdout
                .flush()
                .await
                .map_err(|e| write_error(Path::new("<stdout>"), e))?;
        }
    }
    Ok(())
}

fn write_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorKind::FileWrite(format!(
        "{}: {}",
        path.display(),
        e
    )))
}
