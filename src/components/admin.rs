//! Leptos building blocks for admin pages rendered on the client.
//!
//! Each component is handed its entity context as props, so nothing is looked
//! up from the DOM when an event fires. All of them read [`AdminContext`],
//! which [`AdminProvider`] installs; any transport can sit behind it.

use crate::bind::read_upload;
use crate::commands::{Command, Severity, UPLOAD_IMAGE_ALERT};
use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::models::{EditableField, EntityId, EntityRef, ImageAttachment, NewEntityTemplate};
use crate::state::{AdminContext, AdminState};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn AdminProvider(
    /// Defaults to the browser configuration.
    #[prop(optional)]
    context: Option<AdminContext>,
    children: Children,
) -> impl IntoView {
    provide_context(context.unwrap_or_else(|| AdminContext::new(AdminState::from_env())));
    children()
}

/// Inline-editable text bound to one column of one record.
#[component]
pub fn EditableText(
    field: EditableField,
    #[prop(into)] value: String,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let admin = expect_context::<AdminContext>();
    let node_ref: NodeRef<html::Div> = NodeRef::new();
    let data_field = field.field.clone();

    let on_focus = {
        let admin = admin.clone();
        let field = field.clone();
        move |_: web_sys::FocusEvent| {
            if let Some(el) = node_ref.get_untracked() {
                admin.focus(&field, &el.inner_text());
            }
        }
    };

    let on_blur = move |_: web_sys::FocusEvent| {
        let Some(el) = node_ref.get_untracked() else {
            return;
        };
        let saving = admin.blur(field.clone(), el.inner_text());
        spawn_local(async move {
            // Field failures are console-only; the dispatcher already logged it.
            let _ = saving.await;
        });
    };

    view! {
        <div
            node_ref=node_ref
            class=class
            contenteditable="true"
            data-field=data_field
            on:focus=on_focus
            on:blur=on_blur
        >
            {value}
        </div>
    }
}

#[component]
pub fn AddInstanceButton(
    section_id: EntityId,
    #[prop(into)] table: String,
    /// Seed `link_text`/`link_url` as well.
    #[prop(optional)]
    with_links: bool,
    children: Children,
) -> impl IntoView {
    let admin = expect_context::<AdminContext>();
    let template = NewEntityTemplate::new(section_id, table);
    let template = if with_links {
        template.with_links()
    } else {
        template
    };

    view! {
        <Button
            variant=ButtonVariant::Outline
            size=ButtonSize::Sm
            on:click=move |ev: web_sys::MouseEvent| {
                ev.prevent_default();
                let sending = admin.dispatch(Command::CreateInstance(template.clone()));
                spawn_local(async move {
                    let _ = sending.await;
                });
            }
        >
            {children()}
        </Button>
    }
}

#[component]
pub fn DeleteInstanceButton(entity: EntityRef, children: Children) -> impl IntoView {
    let admin = expect_context::<AdminContext>();

    view! {
        <Button
            variant=ButtonVariant::Destructive
            size=ButtonSize::Sm
            on:click=move |ev: web_sys::MouseEvent| {
                ev.prevent_default();
                let sending = admin.dispatch(Command::DeleteInstance(entity.clone()));
                spawn_local(async move {
                    let _ = sending.await;
                });
            }
        >
            {children()}
        </Button>
    }
}

/// Remove or replace an existing image by reference.
#[component]
pub fn ImageActionButton(attachment: ImageAttachment, children: Children) -> impl IntoView {
    let admin = expect_context::<AdminContext>();

    view! {
        <Button
            variant=ButtonVariant::Ghost
            size=ButtonSize::Sm
            on:click=move |ev: web_sys::MouseEvent| {
                ev.prevent_default();
                let sending = admin.dispatch(Command::UpdateImage(attachment.clone()));
                spawn_local(async move {
                    let _ = sending.await;
                });
            }
        >
            {children()}
        </Button>
    }
}

/// Multipart upload form. Children must include an `image_type` control and
/// the file input.
#[component]
pub fn ImageUploadForm(
    entity: EntityRef,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let admin = expect_context::<AdminContext>();
    let form_ref: NodeRef<html::Form> = NodeRef::new();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(form) = form_ref.get_untracked() else {
            return;
        };
        let admin = admin.clone();
        let entity = entity.clone();

        spawn_local(async move {
            match read_upload(&form).await {
                Ok((body, image_type)) => {
                    let _ = admin
                        .dispatch(Command::UploadImage {
                            entity,
                            image_type,
                            form: body,
                        })
                        .await;
                }
                Err(e) => admin.report(Severity::UserVisible(UPLOAD_IMAGE_ALERT), &e),
            }
        });
    };

    view! {
        <form node_ref=form_ref class=class enctype="multipart/form-data" on:submit=on_submit>
            {children()}
        </form>
    }
}
