use super::js_err;
use crate::api::{FilePart, MultipartBody};
use crate::context::IMAGE_TYPE_CONTROL;
use crate::error::ContextError;
use crate::models::ImageType;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, HtmlFormElement};

/// Snapshot of an upload form plus the image slot its `image_type` control
/// selects. File contents are read into memory for this one request only.
pub(crate) async fn read_upload(
    form: &HtmlFormElement,
) -> Result<(MultipartBody, ImageType), ContextError> {
    let data = FormData::new_with_form(form).map_err(js_err)?;

    let image_type = data
        .get(IMAGE_TYPE_CONTROL)
        .as_string()
        .ok_or(ContextError::MissingControl {
            name: IMAGE_TYPE_CONTROL,
        })?;

    let entries = js_sys::try_iter(&data)
        .map_err(js_err)?
        .ok_or_else(|| ContextError::Js("form data is not iterable".to_string()))?;

    let mut body = MultipartBody::new();
    for entry in entries {
        let pair = js_sys::Array::from(&entry.map_err(js_err)?);
        let Some(name) = pair.get(0).as_string() else {
            continue;
        };

        let value = pair.get(1);
        if let Some(text) = value.as_string() {
            body.push_text(name, text);
            continue;
        }

        if let Ok(file) = value.dyn_into::<File>() {
            let buf = JsFuture::from(file.array_buffer())
                .await
                .map_err(js_err)?;
            body = body.file(
                name,
                FilePart {
                    file_name: file.name(),
                    mime: Some(file.type_()),
                    bytes: js_sys::Uint8Array::new(&buf).to_vec(),
                },
            );
        }
    }

    Ok((body, ImageType(image_type)))
}
