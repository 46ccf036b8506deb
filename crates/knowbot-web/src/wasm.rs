#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the Knowbot widget.
//!
//! [`Knowbot`] owns a shared [`Driver`] (session controller + browser
//! timer) and every DOM listener it registered. Listeners and the timer
//! callback hold weak references, so dropping or destroying the widget
//! releases everything. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::JSON;
use knowbot_core::host::ACTIVE_CLASS;
use knowbot_core::markup::{
    self, CLOSE_CONTROL_ID, CONTAINER_ID, CONTENT_SURFACE_ID, CONTENT_WRAPPER_ID,
    LAUNCHER_ADDRESS_ATTRIBUTE, LAUNCHER_ID, THEME_STYLE_ID,
};
use knowbot_core::visibility::PageMetrics;
use knowbot_core::{
    ConfigError, PageHost, SessionController, StyleProperty, WidgetConfig, WidgetElement,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement,
    HtmlIFrameElement, KeyboardEvent, Window,
};
use web_time::Instant;

use crate::bridge::{self, DOCUMENT_EVENTS, PASSIVE_EVENTS, WINDOW_EVENTS};
use crate::error::WidgetError;
use crate::logging;

const LOG_TARGET: &str = "knowbot.web";

/// Route panics to `console.error`. Installed once per page.
fn install_panic_hook() {
    static HOOK: std::sync::Once = std::sync::Once::new();
    HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let origin = info
                .location()
                .map(|loc| format!(" ({}:{})", loc.file(), loc.line()))
                .unwrap_or_default();
            let message = format!("knowbot: widget panicked{origin}: {info}");
            web_sys::console::error_1(&JsValue::from_str(&message));
        }));
    });
}

/// Log a rejected page write and carry on.
fn report<T>(result: Result<T, JsValue>, op: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(target: LOG_TARGET, op, error = ?err, "page write failed");
            None
        }
    }
}

fn element_by_id<T: JsCast>(document: &Document, id: &'static str) -> Result<T, WidgetError> {
    document
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<T>().ok())
        .ok_or(WidgetError::MissingElement { id })
}

// ---------------------------------------------------------------------------
// Page host
// ---------------------------------------------------------------------------

/// [`PageHost`] over the live document. Page classes and lock styles go on
/// `<body>`.
struct DomHost {
    window: Window,
    document: Document,
    body: HtmlElement,
    launcher: Option<HtmlElement>,
    close_control: HtmlElement,
    overlay: HtmlElement,
    surface: Option<HtmlIFrameElement>,
}

impl DomHost {
    fn hash(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn element(&self, element: WidgetElement) -> Option<&HtmlElement> {
        match element {
            WidgetElement::Launcher => self.launcher.as_ref(),
            WidgetElement::CloseControl => Some(&self.close_control),
            WidgetElement::Overlay => Some(&self.overlay),
        }
    }

    fn viewport_dimension(value: Result<JsValue, JsValue>) -> f64 {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    }
}

impl PageHost for DomHost {
    fn metrics(&self) -> PageMetrics {
        PageMetrics {
            scroll_offset: self.window.scroll_y().unwrap_or(0.0),
            viewport_width: Self::viewport_dimension(self.window.inner_width()),
            viewport_height: Self::viewport_dimension(self.window.inner_height()),
        }
    }

    fn path(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn set_page_class(&mut self, class: &str, enabled: bool) {
        report(
            self.body.class_list().toggle_with_force(class, enabled),
            "set_page_class",
        );
    }

    fn set_element_visible(&mut self, element: WidgetElement, visible: bool) {
        let Some(node) = self.element(element) else {
            return;
        };
        let display = if visible { "block" } else { "none" };
        report(
            node.style().set_property("display", display),
            "set_element_visible",
        );
    }

    fn inline_style(&self, property: StyleProperty) -> String {
        self.body
            .style()
            .get_property_value(property.css_name())
            .unwrap_or_default()
    }

    fn set_inline_style(&mut self, property: StyleProperty, value: &str) {
        let style = self.body.style();
        if value.is_empty() {
            report(style.remove_property(property.css_name()), "set_inline_style");
        } else {
            report(
                style.set_property(property.css_name(), value),
                "set_inline_style",
            );
        }
    }

    fn scroll_to(&mut self, offset: f64) {
        self.window.scroll_to_with_x_and_y(0.0, offset);
    }

    fn create_content_surface(&mut self) -> bool {
        let Some(element) = report(self.document.create_element("iframe"), "create_iframe")
        else {
            return false;
        };
        let Ok(iframe) = element.dyn_into::<HtmlIFrameElement>() else {
            return false;
        };
        iframe.set_id(CONTENT_SURFACE_ID);
        report(iframe.set_attribute("aria-hidden", "true"), "create_iframe");
        if report(self.overlay.append_child(&iframe), "create_iframe").is_none() {
            return false;
        }
        self.surface = Some(iframe);
        true
    }

    fn set_content_address(&mut self, address: &str) {
        if let Some(iframe) = &self.surface {
            iframe.set_src(address);
        }
    }

    fn set_content_hidden(&mut self, hidden: bool) {
        if let Some(iframe) = &self.surface {
            let value = if hidden { "true" } else { "false" };
            report(iframe.set_attribute("aria-hidden", value), "set_content_hidden");
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Session controller plus the single browser timeout armed for its next
/// deadline.
struct Driver {
    session: SessionController<DomHost>,
    epoch: Instant,
    timeout_id: Option<i32>,
    on_timeout: Option<Closure<dyn FnMut()>>,
}

type SharedDriver = Rc<RefCell<Driver>>;

impl Driver {
    /// Catch the controller up to wall time, run `action`, re-arm the timer.
    fn dispatch(&mut self, action: impl FnOnce(&mut SessionController<DomHost>)) {
        self.session.advance_to(self.epoch.elapsed());
        action(&mut self.session);
        self.rearm();
    }

    fn rearm(&mut self) {
        if let Some(id) = self.timeout_id.take() {
            self.session.host().window.clear_timeout_with_handle(id);
        }
        let Some(deadline) = self.session.next_deadline() else {
            return;
        };
        let Some(callback) = &self.on_timeout else {
            return;
        };
        let delay = bridge::timeout_delay_ms(deadline, self.session.now());
        self.timeout_id = report(
            self.session
                .host()
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.as_ref().unchecked_ref(),
                    delay,
                ),
            "set_timeout",
        );
    }

    fn disarm(&mut self) {
        if let Some(id) = self.timeout_id.take() {
            self.session.host().window.clear_timeout_with_handle(id);
        }
        self.on_timeout = None;
    }
}

/// Run `action` on a live, unborrowed driver.
fn with_driver(weak: &Weak<RefCell<Driver>>, action: impl FnOnce(&mut Driver)) {
    let Some(driver) = weak.upgrade() else {
        return;
    };
    let Ok(mut driver) = driver.try_borrow_mut() else {
        tracing::debug!(target: LOG_TARGET, "re-entrant callback dropped");
        return;
    };
    action(&mut driver);
}

fn timeout_callback(driver: &SharedDriver) -> Closure<dyn FnMut()> {
    let weak = Rc::downgrade(driver);
    Closure::new(move || {
        with_driver(&weak, |driver| {
            driver.timeout_id = None;
            driver.dispatch(|_| {});
        });
    })
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<Self, WidgetError> {
        let options = AddEventListenerOptions::new();
        options.set_passive(PASSIVE_EVENTS.contains(&kind));
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }

    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

fn page_listener(driver: &SharedDriver, window: &Window) -> Closure<dyn FnMut(Event)> {
    let weak = Rc::downgrade(driver);
    let window = window.clone();
    Closure::new(move |event: Event| {
        let Some(signal) = bridge::page_signal(&event.type_()) else {
            return;
        };
        with_driver(&weak, |driver| {
            driver.dispatch(|session| {
                bridge::apply_signal(session, signal, || {
                    window.location().hash().unwrap_or_default()
                });
            });
        });
    })
}

/// Click or activation key on a `role="button"` element.
fn button_listener(
    driver: &SharedDriver,
    action: impl Fn(&mut SessionController<DomHost>, &Event) + 'static,
) -> Closure<dyn FnMut(Event)> {
    let weak = Rc::downgrade(driver);
    Closure::new(move |event: Event| {
        if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
            if !bridge::is_activation_key(&key.key()) {
                return;
            }
        }
        event.prevent_default();
        with_driver(&weak, |driver| driver.dispatch(|session| action(session, &event)));
    })
}

fn open_from_launcher(session: &mut SessionController<DomHost>, event: &Event) {
    let address = event
        .current_target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|element| element.get_attribute(LAUNCHER_ADDRESS_ATTRIBUTE));
    match bridge::deep_link(address.as_deref()) {
        Some(address) => session.open_at(&address),
        None => session.open(),
    }
}

// ---------------------------------------------------------------------------
// Mount
// ---------------------------------------------------------------------------

fn options_json(options: &JsValue) -> Result<String, WidgetError> {
    if options.is_undefined() || options.is_null() {
        return Ok("{}".to_owned());
    }
    JSON::stringify(options)?
        .as_string()
        .ok_or(WidgetError::Config(ConfigError::NotAnObject))
}

/// Insert the theme and widget markup; returns the nodes to remove later.
fn render(
    document: &Document,
    body: &HtmlElement,
    config: &WidgetConfig,
) -> Result<Vec<Element>, WidgetError> {
    if let Some(theme) = markup::render_theme(&config.theme) {
        match document.head() {
            Some(head) => head.insert_adjacent_html("beforeend", &theme)?,
            None => body.insert_adjacent_html("beforeend", &theme)?,
        }
    }
    body.insert_adjacent_html("beforeend", &markup::render_widget(config))?;

    let mut mounted = Vec::new();
    for id in [THEME_STYLE_ID, LAUNCHER_ID, CONTAINER_ID] {
        if let Some(element) = document.get_element_by_id(id) {
            mounted.push(element);
        }
    }
    Ok(mounted)
}

fn mount(options: &JsValue) -> Result<Knowbot, WidgetError> {
    let json = options_json(options)?;
    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(ConfigError::from)?;
    let debug = value
        .get("debug")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    logging::install(debug);

    let config = WidgetConfig::from_json_value(value)?.config;

    let window = web_sys::window().ok_or(WidgetError::NoWindow)?;
    let document = window.document().ok_or(WidgetError::NoWindow)?;
    let body = document.body().ok_or(WidgetError::NoBody)?;

    let mounted = render(&document, &body, &config)?;
    attach(window, document, body, config, mounted.clone()).inspect_err(|_| {
        for element in &mounted {
            element.remove();
        }
    })
}

/// Wire the rendered markup to a fresh controller.
fn attach(
    window: Window,
    document: Document,
    body: HtmlElement,
    config: WidgetConfig,
    mounted: Vec<Element>,
) -> Result<Knowbot, WidgetError> {
    let launcher = match config.launcher_label {
        Some(_) => Some(element_by_id::<HtmlElement>(&document, LAUNCHER_ID)?),
        None => None,
    };
    let close_control = element_by_id::<HtmlElement>(&document, CLOSE_CONTROL_ID)?;
    let overlay = element_by_id::<HtmlElement>(&document, CONTENT_WRAPPER_ID)?;
    let custom_launchers = document.query_selector_all(&config.launcher_selector)?;

    let host = DomHost {
        window: window.clone(),
        document: document.clone(),
        body,
        launcher: launcher.clone(),
        close_control: close_control.clone(),
        overlay,
        surface: None,
    };
    let session = SessionController::new(config, host)?;
    let driver: SharedDriver = Rc::new(RefCell::new(Driver {
        session,
        epoch: Instant::now(),
        timeout_id: None,
        on_timeout: None,
    }));
    driver.borrow_mut().on_timeout = Some(timeout_callback(&driver));

    let mut widget = Knowbot {
        driver: Rc::clone(&driver),
        listeners: Vec::new(),
        mounted,
        destroyed: false,
    };

    for kind in WINDOW_EVENTS {
        widget.listen(&window, kind, page_listener(&driver, &window))?;
    }
    for kind in DOCUMENT_EVENTS {
        widget.listen(&document, kind, page_listener(&driver, &window))?;
    }
    if let Some(control) = &launcher {
        for kind in ["click", "keydown"] {
            widget.listen(control, kind, button_listener(&driver, open_from_launcher))?;
        }
    }
    for kind in ["click", "keydown"] {
        widget.listen(
            &close_control,
            kind,
            button_listener(&driver, |session, _| session.close()),
        )?;
    }
    for index in 0..custom_launchers.length() {
        let Some(node) = custom_launchers.item(index) else {
            continue;
        };
        widget.listen(&node, "click", button_listener(&driver, open_from_launcher))?;
    }

    // A page loaded with the open anchor already in its address opens at once.
    driver.borrow_mut().dispatch(|session| {
        let hash = session.host().hash();
        session.on_navigation(&hash);
    });

    tracing::debug!(
        target: LOG_TARGET,
        listeners = widget.listeners.len(),
        custom_launchers = custom_launchers.length(),
        "widget mounted"
    );
    Ok(widget)
}

// ---------------------------------------------------------------------------
// JS API
// ---------------------------------------------------------------------------

/// The Knowbot widget, mounted into the current page.
#[wasm_bindgen]
pub struct Knowbot {
    driver: SharedDriver,
    listeners: Vec<Listener>,
    mounted: Vec<Element>,
    destroyed: bool,
}

impl Knowbot {
    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<(), WidgetError> {
        self.listeners.push(Listener::attach(target, kind, callback)?);
        Ok(())
    }

    fn with_session(&self, action: impl FnOnce(&mut SessionController<DomHost>)) {
        if self.destroyed {
            return;
        }
        with_driver(&Rc::downgrade(&self.driver), |driver| driver.dispatch(action));
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for listener in self.listeners.drain(..) {
            listener.detach();
        }
        if let Ok(mut driver) = self.driver.try_borrow_mut() {
            driver.session.close();
            driver.session.host_mut().set_page_class(ACTIVE_CLASS, false);
            driver.disarm();
        }
        for element in self.mounted.drain(..) {
            element.remove();
        }
        tracing::debug!(target: LOG_TARGET, "widget destroyed");
    }
}

#[wasm_bindgen]
impl Knowbot {
    /// Render the widget and start listening. `options` is a plain object
    /// with the documented camelCase keys; `url` is required.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<Knowbot, JsValue> {
        install_panic_hook();
        mount(&options).map_err(|err| {
            tracing::error!(target: LOG_TARGET, error = %err, "mount failed");
            JsValue::from(err)
        })
    }

    pub fn open(&self) {
        self.with_session(SessionController::open);
    }

    pub fn close(&self) {
        self.with_session(SessionController::close);
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.driver
            .try_borrow()
            .is_ok_and(|driver| driver.session.is_open())
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.driver
            .try_borrow()
            .is_ok_and(|driver| driver.session.is_active())
    }

    /// Remove the widget from the page: listeners, pending timer, markup,
    /// page classes and any scroll lock. Further calls are no-ops.
    pub fn destroy(&mut self) {
        self.teardown();
    }
}

impl Drop for Knowbot {
    fn drop(&mut self) {
        self.teardown();
    }
}
