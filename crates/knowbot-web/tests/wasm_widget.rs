#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use knowbot_web::Knowbot;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .and_then(|window| window.document())
        .expect("browser document")
}

fn body() -> HtmlElement {
    document().body().expect("document body")
}

fn options(json: &str) -> JsValue {
    js_sys::JSON::parse(json).expect("test options should parse")
}

fn mount(json: &str) -> Knowbot {
    Knowbot::new(options(json)).expect("widget should mount")
}

fn display_of(id: &str) -> String {
    document()
        .get_element_by_id(id)
        .and_then(|element| element.get_attribute("style"))
        .unwrap_or_default()
}

#[wasm_bindgen_test]
fn mount_renders_launcher_and_hidden_overlay() {
    let mut widget = mount(r#"{"url":"https://bot.example.org/chat"}"#);

    assert!(document().get_element_by_id("knowbot-button").is_some());
    assert!(document().get_element_by_id("knowbot-container").is_some());
    assert!(display_of("knowbot-iframe-wrapper").contains("none"));
    assert!(!widget.is_open());

    widget.destroy();
    assert!(document().get_element_by_id("knowbot-button").is_none());
    assert!(document().get_element_by_id("knowbot-container").is_none());
}

#[wasm_bindgen_test]
fn open_and_close_toggle_page_state() {
    let mut widget = mount(r#"{"url":"https://bot.example.org/chat","mobileScrollLock":false}"#);

    widget.open();
    assert!(widget.is_open());
    assert!(widget.is_active());
    assert!(body().class_list().contains("knowbot-open"));
    assert!(body().class_list().contains("knowbot-active"));
    let iframe = document()
        .get_element_by_id("knowbot-iframe")
        .expect("content surface created on open");
    assert_eq!(
        iframe.get_attribute("src").as_deref(),
        Some("https://bot.example.org/chat")
    );
    assert_eq!(iframe.get_attribute("aria-hidden").as_deref(), Some("false"));

    widget.close();
    assert!(!widget.is_open());
    assert!(!body().class_list().contains("knowbot-open"));
    assert_eq!(iframe.get_attribute("aria-hidden").as_deref(), Some("true"));

    widget.destroy();
    assert!(!body().class_list().contains("knowbot-active"));
}

#[wasm_bindgen_test]
fn disabled_launcher_is_not_rendered() {
    let mut widget = mount(r#"{"url":"/knowbot/embed","button":false}"#);

    assert!(document().get_element_by_id("knowbot-button").is_none());
    assert!(document().get_element_by_id("knowbot-close").is_some());

    widget.destroy();
}

#[wasm_bindgen_test]
fn missing_url_fails_without_leaving_markup() {
    let err = Knowbot::new(options("{}")).err().expect("mount must fail");

    let message = err
        .dyn_into::<js_sys::Error>()
        .expect("mount errors are Error objects")
        .message();
    assert!(String::from(message).contains("url"));
    assert!(document().get_element_by_id("knowbot-container").is_none());
}

#[wasm_bindgen_test]
fn options_that_do_not_serialize_are_rejected() {
    let options: JsValue = js_sys::Function::new_no_args("return 1;").into();

    let err = Knowbot::new(options).err().expect("mount must fail");

    let message = err
        .dyn_into::<js_sys::Error>()
        .expect("mount errors are Error objects")
        .message();
    assert!(String::from(message).contains("JSON object"));
    assert!(document().get_element_by_id("knowbot-container").is_none());
}

#[wasm_bindgen_test]
fn calls_after_destroy_are_ignored() {
    let mut widget = mount(r#"{"url":"https://bot.example.org/chat"}"#);

    widget.destroy();
    widget.open();
    widget.destroy();

    assert!(document().get_element_by_id("knowbot-iframe").is_none());
}
