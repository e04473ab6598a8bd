//! Attaches the admin handlers to a server-rendered page.
//!
//! Context is resolved once per element while binding, so each listener
//! carries its own entity reference instead of walking the DOM when it fires.
//! Elements whose annotations do not resolve are skipped with a warning.

mod form;

pub(crate) use form::read_upload;

use crate::api::Transport;
use crate::commands::{Command, Severity, UPLOAD_IMAGE_ALERT};
use crate::context::{
    resolve_editable_field, resolve_entity_ref, resolve_image_attachment, resolve_new_entity,
    Annotated, FIELD_ATTR,
};
use crate::error::ContextError;
use crate::state::AdminState;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, HtmlFormElement};

pub const ADD_INSTANCE_SELECTOR: &str = ".js-add-instance";
pub const DELETE_INSTANCE_SELECTOR: &str = ".js-delete-instance";
pub const UPLOAD_IMAGE_SELECTOR: &str = ".js-upload-image";
pub const UPDATE_IMAGE_SELECTOR: &str = ".js-update-image";

impl Annotated for Element {
    fn annotation(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }
}

/// The element followed by each of its ancestors.
pub(crate) fn ancestry(el: &Element) -> Vec<Element> {
    let mut out = vec![el.clone()];
    let mut cur = el.parent_element();
    while let Some(parent) = cur {
        cur = parent.parent_element();
        out.push(parent);
    }
    out
}

/// Rendered text of an element, as the user sees it.
pub(crate) fn current_text(el: &Element) -> String {
    match el.dyn_ref::<HtmlElement>() {
        Some(html) => html.inner_text(),
        None => el.text_content().unwrap_or_default(),
    }
}

pub(crate) fn js_err(v: JsValue) -> ContextError {
    ContextError::Js(v.as_string().unwrap_or_else(|| format!("{v:?}")))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindReport {
    pub fields: usize,
    pub add_buttons: usize,
    pub delete_buttons: usize,
    pub upload_forms: usize,
    pub image_buttons: usize,
    pub skipped: usize,
}

/// Binds once the document has been parsed.
pub fn bind_when_ready<T: Transport + 'static>(state: AdminState<T>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        tracing::warn!("no document to bind");
        return;
    };

    if document.ready_state() != "loading" {
        bind_document(&document, &state);
        return;
    }

    let doc = document.clone();
    let cb = Closure::once_into_js(move || {
        bind_document(&doc, &state);
    });
    if let Err(e) =
        document.add_event_listener_with_callback("DOMContentLoaded", cb.unchecked_ref())
    {
        tracing::error!(error = %js_err(e), "could not wait for DOMContentLoaded");
    }
}

pub fn bind_document<T>(document: &Document, state: &AdminState<T>) -> BindReport
where
    T: Transport + 'static,
{
    match document.document_element() {
        Some(root) => bind_element(&root, state),
        None => {
            tracing::warn!("document has no root element");
            BindReport::default()
        }
    }
}

/// Binds every annotated descendant of `root`.
pub fn bind_element<T>(root: &Element, state: &AdminState<T>) -> BindReport
where
    T: Transport + 'static,
{
    let mut report = BindReport::default();

    report.fields = bind_all(root, &format!("[{FIELD_ATTR}]"), &mut report.skipped, |el| {
        bind_field(el, state)
    });
    report.add_buttons = bind_all(root, ADD_INSTANCE_SELECTOR, &mut report.skipped, |el| {
        bind_add_instance(el, state)
    });
    report.delete_buttons =
        bind_all(root, DELETE_INSTANCE_SELECTOR, &mut report.skipped, |el| {
            bind_delete_instance(el, state)
        });
    report.upload_forms = bind_all(root, UPLOAD_IMAGE_SELECTOR, &mut report.skipped, |el| {
        bind_upload_form(el, state)
    });
    report.image_buttons = bind_all(root, UPDATE_IMAGE_SELECTOR, &mut report.skipped, |el| {
        bind_update_image(el, state)
    });

    tracing::info!(
        fields = report.fields,
        add_buttons = report.add_buttons,
        delete_buttons = report.delete_buttons,
        upload_forms = report.upload_forms,
        image_buttons = report.image_buttons,
        skipped = report.skipped,
        "admin handlers bound"
    );
    report
}

fn bind_all(
    root: &Element,
    selector: &str,
    skipped: &mut usize,
    mut bind: impl FnMut(&Element) -> Result<(), ContextError>,
) -> usize {
    let nodes = match root.query_selector_all(selector) {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::error!(selector, error = %js_err(e), "query failed");
            return 0;
        }
    };

    let mut bound = 0;
    for i in 0..nodes.length() {
        let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        match bind(&el) {
            Ok(()) => bound += 1,
            Err(e) => {
                *skipped += 1;
                tracing::warn!(selector, error = %e, "skipping element");
            }
        }
    }
    bound
}

fn listen(el: &Element, event: &str, handler: impl FnMut(Event) + 'static) -> Result<(), ContextError> {
    let cb = Closure::<dyn FnMut(Event)>::new(handler);
    el.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())
        .map_err(js_err)?;
    // Handlers live as long as the page.
    cb.forget();
    Ok(())
}

fn bind_field<T: Transport + 'static>(
    el: &Element,
    state: &AdminState<T>,
) -> Result<(), ContextError> {
    let field = resolve_editable_field(&ancestry(el))?;

    let engine = state.fields.clone();
    let f = field.clone();
    let target = el.clone();
    listen(el, "focus", move |_ev| {
        engine.focus(&f, &current_text(&target));
    })?;

    let engine = state.fields.clone();
    let target = el.clone();
    listen(el, "blur", move |_ev| {
        let engine = engine.clone();
        let field = field.clone();
        let value = current_text(&target);
        wasm_bindgen_futures::spawn_local(async move {
            // Failures are logged by the dispatcher and stay silent here.
            let _ = engine.blur(&field, &value).await;
        });
    })
}

fn bind_add_instance<T: Transport + 'static>(
    el: &Element,
    state: &AdminState<T>,
) -> Result<(), ContextError> {
    let template = resolve_new_entity(&ancestry(el))?;
    let dispatcher = state.dispatcher.clone();

    listen(el, "click", move |ev| {
        ev.prevent_default();
        let dispatcher = dispatcher.clone();
        let command = Command::CreateInstance(template.clone());
        wasm_bindgen_futures::spawn_local(async move {
            let _ = dispatcher.dispatch(command).await;
        });
    })
}

fn bind_delete_instance<T: Transport + 'static>(
    el: &Element,
    state: &AdminState<T>,
) -> Result<(), ContextError> {
    let entity = resolve_entity_ref(&ancestry(el))?;
    let dispatcher = state.dispatcher.clone();

    listen(el, "click", move |ev| {
        ev.prevent_default();
        let dispatcher = dispatcher.clone();
        let command = Command::DeleteInstance(entity.clone());
        wasm_bindgen_futures::spawn_local(async move {
            let _ = dispatcher.dispatch(command).await;
        });
    })
}

fn bind_upload_form<T: Transport + 'static>(
    el: &Element,
    state: &AdminState<T>,
) -> Result<(), ContextError> {
    let entity = resolve_entity_ref(&ancestry(el))?;
    let form = el
        .clone()
        .dyn_into::<HtmlFormElement>()
        .map_err(|_| ContextError::Js("upload target is not a <form>".to_string()))?;
    let dispatcher = state.dispatcher.clone();

    listen(el, "submit", move |ev| {
        ev.prevent_default();
        let dispatcher = dispatcher.clone();
        let entity = entity.clone();
        let form = form.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match read_upload(&form).await {
                Ok((body, image_type)) => {
                    let _ = dispatcher
                        .dispatch(Command::UploadImage {
                            entity,
                            image_type,
                            form: body,
                        })
                        .await;
                }
                Err(e) => dispatcher.report(Severity::UserVisible(UPLOAD_IMAGE_ALERT), &e),
            }
        });
    })
}

fn bind_update_image<T: Transport + 'static>(
    el: &Element,
    state: &AdminState<T>,
) -> Result<(), ContextError> {
    let attachment = resolve_image_attachment(&ancestry(el))?;
    let dispatcher = state.dispatcher.clone();

    listen(el, "click", move |ev| {
        ev.prevent_default();
        let dispatcher = dispatcher.clone();
        let command = Command::UpdateImage(attachment.clone());
        wasm_bindgen_futures::spawn_local(async move {
            let _ = dispatcher.dispatch(command).await;
        });
    })
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::api::{FormValue, Method, MockTransport};
    use crate::config::ImageWireNaming;
    use crate::dispatch::{Dispatcher, RecordingReporter};
    use crate::models::EntityRef;
    use serde_json::json;
    use std::sync::Arc;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;
    use web_sys::FocusEvent;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture(html: &str) -> Element {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("document");
        let root = document.create_element("div").expect("div");
        root.set_inner_html(html);
        document.body().expect("body").append_child(&root).expect("append");
        root
    }

    fn mock_state() -> (AdminState<MockTransport>, Arc<MockTransport>, Arc<RecordingReporter>) {
        let transport = Arc::new(MockTransport::new());
        let reporter = Arc::new(RecordingReporter::new());
        let state = AdminState::with_dispatcher(Dispatcher::new(
            transport.clone(),
            reporter.clone(),
            ImageWireNaming::Entity,
        ));
        (state, transport, reporter)
    }

    /// Lets spawned handlers and pending promises run.
    async fn settle() {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            if let Some(w) = web_sys::window() {
                let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 20);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    fn fire(el: &Element, event: &Event) {
        el.dispatch_event(event).expect("dispatch");
    }

    #[wasm_bindgen_test]
    fn ancestry_resolves_nested_entity() {
        let root = fixture(
            r#"<section data-table="sections" data-id="7">
                 <ul data-table="achievements">
                   <li data-id="42"><p id="t" data-field="title">Old Title</p></li>
                 </ul>
               </section>"#,
        );
        let p = root.query_selector("#t").expect("query").expect("p");
        let field = resolve_editable_field(&ancestry(&p)).expect("resolves");
        assert_eq!(field.entity, EntityRef::new("achievements", 42));
        assert_eq!(current_text(&p), "Old Title");
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn edited_field_sends_one_patch_on_blur() {
        let root = fixture(
            r#"<ul data-table="achievements">
                 <li data-id="42"><p data-field="title" contenteditable="true">Old Title</p></li>
               </ul>"#,
        );
        let (state, transport, reporter) = mock_state();
        let report = bind_element(&root, &state);
        assert_eq!(report.fields, 1);

        let p = root.query_selector("[data-field]").expect("query").expect("p");
        fire(&p, &FocusEvent::new("focus").expect("focus"));
        p.set_text_content(Some("New Title"));
        fire(&p, &FocusEvent::new("blur").expect("blur"));
        settle().await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Patch);
        assert_eq!(sent[0].path, "/admin/achievements/42");
        assert_eq!(
            sent[0].body.as_json(),
            Some(&json!({"id": 42, "table": "achievements", "title": "New Title"}))
        );

        // Focus and blur without an edit stays local.
        fire(&p, &FocusEvent::new("focus").expect("focus"));
        fire(&p, &FocusEvent::new("blur").expect("blur"));
        settle().await;
        assert_eq!(transport.request_count(), 1);
        assert!(reporter.alerts().is_empty());
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn add_button_posts_template_for_its_section() {
        let root = fixture(
            r#"<section data-table="sections" data-id="7">
                 <button class="js-add-instance" data-table="cards">Add</button>
               </section>"#,
        );
        let (state, transport, _) = mock_state();
        let report = bind_element(&root, &state);
        assert_eq!(report.add_buttons, 1);

        let button = root
            .query_selector(ADD_INSTANCE_SELECTOR)
            .expect("query")
            .expect("button");
        button.dyn_ref::<HtmlElement>().expect("html").click();
        settle().await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/admin/sections/cards");
        let body = sent[0].body.as_json().expect("json");
        assert_eq!(body["section_id"], 7);
        assert_eq!(body["table_name"], "cards");
        assert_eq!(body["order_value"], 0);
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn delete_button_sends_id_in_body() {
        let root = fixture(
            r#"<ul data-table="products">
                 <li data-id="5"><button class="js-delete-instance">x</button></li>
               </ul>"#,
        );
        let (state, transport, _) = mock_state();
        bind_element(&root, &state);

        let button = root
            .query_selector(DELETE_INSTANCE_SELECTOR)
            .expect("query")
            .expect("button");
        button.dyn_ref::<HtmlElement>().expect("html").click();
        settle().await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Delete);
        assert_eq!(sent[0].path, "/admin/sections/products");
        assert_eq!(
            sent[0].body.as_json(),
            Some(&json!({"id": 5, "table_name": "products"}))
        );
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn upload_form_appends_reference_after_its_fields() {
        let root = fixture(
            r#"<div data-table="heroes" data-id="3">
                 <form class="js-upload-image">
                   <input name="image_alt" value="Hero">
                   <input name="image_type" value="desktop">
                 </form>
               </div>"#,
        );
        let (state, transport, reporter) = mock_state();
        let report = bind_element(&root, &state);
        assert_eq!(report.upload_forms, 1);

        let form = root
            .query_selector(UPLOAD_IMAGE_SELECTOR)
            .expect("query")
            .expect("form");
        fire(&form, &Event::new("submit").expect("submit"));
        settle().await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/admin/images");
        let body = sent[0].body.as_multipart().expect("multipart");
        let fields: Vec<(&str, &str)> = body
            .fields
            .iter()
            .filter_map(|(k, v)| match v {
                FormValue::Text(t) => Some((k.as_str(), t.as_str())),
                FormValue::File(_) => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                ("image_alt", "Hero"),
                ("image_type", "desktop"),
                ("entity_name", "heroes"),
                ("entity_id", "3"),
                ("image_type", "desktop"),
            ]
        );
        assert!(reporter.alerts().is_empty());
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn upload_form_without_image_type_alerts() {
        let root = fixture(
            r#"<div data-table="heroes" data-id="3">
                 <form class="js-upload-image"><input name="image_alt" value="Hero"></form>
               </div>"#,
        );
        let (state, transport, reporter) = mock_state();
        bind_element(&root, &state);

        let form = root
            .query_selector(UPLOAD_IMAGE_SELECTOR)
            .expect("query")
            .expect("form");
        fire(&form, &Event::new("submit").expect("submit"));
        settle().await;

        assert_eq!(transport.request_count(), 0);
        let alerts = reporter.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with(UPLOAD_IMAGE_ALERT));
        root.remove();
    }

    #[wasm_bindgen_test]
    fn unresolvable_elements_are_skipped() {
        let root = fixture(r#"<p data-field="title">orphan</p>"#);
        let (state, _, _) = mock_state();

        let report = bind_element(&root, &state);
        assert_eq!(report.fields, 0);
        assert_eq!(report.skipped, 1);
        root.remove();
    }
}
