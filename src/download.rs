//! One-shot delivery of generated files to the user.
//!
//! On the web the bytes are handed to the browser as a Blob download; native
//! builds ask for a destination with a save dialog on a background task.

/// Offers `bytes` for download under `filename`.
///
/// Native builds need a tokio runtime to show the save dialog on. Failures
/// after the dialog is shown are logged, not returned.
pub fn offer(filename: &str, mime: &str, bytes: Vec<u8>) -> Result<(), String> {
    log::info!("Offering {filename} ({mime}, {} bytes) for download", bytes.len());

    #[cfg(target_arch = "wasm32")]
    {
        trigger_download(filename, mime, &bytes)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let filename = filename.to_string();
        let extension = std::path::Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;
        runtime.spawn(async move {
            let mut dialog = rfd::AsyncFileDialog::new().set_file_name(&filename);
            if !extension.is_empty() {
                dialog = dialog.add_filter(extension.to_uppercase(), &[extension.as_str()]);
            }
            if let Some(handle) = dialog.save_file().await {
                let path = handle.path();
                match std::fs::write(path, &bytes) {
                    Ok(()) => log::info!("Saved {}", path.display()),
                    Err(e) => log::error!("Failed to save {}: {e}", path.display()),
                }
            }
        });
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
fn trigger_download(filename: &str, mime: &str, bytes: &[u8]) -> Result<(), String> {
    use wasm_bindgen::JsCast;
    use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

    let window = web_sys::window().ok_or("No window found")?;
    let document = window.document().ok_or("No document found")?;

    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());

    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|_| "Failed to create blob")?;
    let url = Url::create_object_url_with_blob(&blob).map_err(|_| "Failed to create object URL")?;

    let anchor = document
        .create_element("a")
        .map_err(|_| "Failed to create anchor element")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| "Failed to cast to anchor element")?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.style().set_property("display", "none").ok();

    let body = document.body().ok_or("No body found")?;
    body.append_child(&anchor).map_err(|_| "Failed to append anchor")?;
    anchor.click();
    body.remove_child(&anchor).map_err(|_| "Failed to remove anchor")?;

    Url::revoke_object_url(&url).map_err(|_| "Failed to revoke object URL")?;
    Ok(())
}
