#![forbid(unsafe_code)]

//! Page abstraction the session controller writes through.
//!
//! The controller never talks to a browser directly. Everything it reads
//! (scroll offset, viewport, path) and everything it writes (page classes,
//! element visibility, inline lock styles, the content surface) goes through
//! [`PageHost`]. `knowbot-web` implements it over `web-sys`;
//! [`HeadlessPage`] implements it in memory for native hosts and tests.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::visibility::PageMetrics;

/// Page class set while the widget chrome should render as visible.
pub const ACTIVE_CLASS: &str = "knowbot-active";

/// Page class set while the session is open.
pub const OPEN_CLASS: &str = "knowbot-open";

/// Widget-owned elements whose visibility the controller toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WidgetElement {
    /// Floating launcher button.
    Launcher,
    /// Close control inside the overlay.
    CloseControl,
    /// Overlay container hosting the content surface.
    Overlay,
}

/// Inline page style properties touched by the scroll lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleProperty {
    Position,
    Top,
    Width,
    Overflow,
}

impl StyleProperty {
    pub const ALL: [Self; 4] = [Self::Position, Self::Top, Self::Width, Self::Overflow];

    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Top => "top",
            Self::Width => "width",
            Self::Overflow => "overflow",
        }
    }
}

/// Reads and writes the controller performs against the page.
///
/// Implementations only ever touch widget-owned nodes and the four inline
/// properties in [`StyleProperty`].
pub trait PageHost {
    fn metrics(&self) -> PageMetrics;

    /// Current location path, e.g. `/docs/setup`.
    fn path(&self) -> String;

    fn set_page_class(&mut self, class: &str, enabled: bool);

    fn set_element_visible(&mut self, element: WidgetElement, visible: bool);

    /// Current inline value, empty when unset.
    fn inline_style(&self, property: StyleProperty) -> String;

    /// Set an inline value; an empty value clears the property.
    fn set_inline_style(&mut self, property: StyleProperty, value: &str);

    fn scroll_to(&mut self, offset: f64);

    /// Create the content surface and attach it to the overlay. Returns
    /// `false` when the page refused the new node.
    fn create_content_surface(&mut self) -> bool;

    fn set_content_address(&mut self, address: &str);

    fn set_content_hidden(&mut self, hidden: bool);
}

/// In-memory content surface of a [`HeadlessPage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessSurface {
    pub address: String,
    pub hidden: bool,
}

/// In-memory [`PageHost`] that records what the controller did.
#[derive(Debug, Clone)]
pub struct HeadlessPage {
    pub metrics: PageMetrics,
    pub path: String,
    pub classes: BTreeSet<String>,
    pub visible: BTreeMap<WidgetElement, bool>,
    pub styles: BTreeMap<StyleProperty, String>,
    pub surface: Option<HeadlessSurface>,
    /// Number of content surfaces ever created.
    pub surfaces_created: u32,
    /// Number of page class writes, to observe redundant work.
    pub class_writes: u32,
    /// Every address assigned to the surface, in order.
    pub address_log: Vec<String>,
    /// Every `scroll_to` target, in order.
    pub scroll_log: Vec<f64>,
    /// When set, surface creation is refused.
    pub reject_surfaces: bool,
}

impl HeadlessPage {
    /// A desktop-sized page at the top of `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            metrics: PageMetrics {
                scroll_offset: 0.0,
                viewport_width: 1280.0,
                viewport_height: 800.0,
            },
            path: path.into(),
            classes: BTreeSet::new(),
            visible: BTreeMap::new(),
            styles: BTreeMap::new(),
            surface: None,
            surfaces_created: 0,
            class_writes: 0,
            address_log: Vec::new(),
            scroll_log: Vec::new(),
            reject_surfaces: false,
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.metrics.viewport_width = width;
        self.metrics.viewport_height = height;
        self
    }

    #[must_use]
    pub fn with_scroll(mut self, offset: f64) -> Self {
        self.metrics.scroll_offset = offset;
        self
    }

    #[must_use]
    pub fn with_style(mut self, property: StyleProperty, value: &str) -> Self {
        self.set_inline_style(property, value);
        self
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Visibility of `element`; never-touched elements report `None`.
    #[must_use]
    pub fn is_visible(&self, element: WidgetElement) -> Option<bool> {
        self.visible.get(&element).copied()
    }

    #[must_use]
    pub fn style(&self, property: StyleProperty) -> &str {
        self.styles.get(&property).map_or("", String::as_str)
    }
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::new("/")
    }
}

impl PageHost for HeadlessPage {
    fn metrics(&self) -> PageMetrics {
        self.metrics
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn set_page_class(&mut self, class: &str, enabled: bool) {
        self.class_writes += 1;
        if enabled {
            self.classes.insert(class.to_owned());
        } else {
            self.classes.remove(class);
        }
    }

    fn set_element_visible(&mut self, element: WidgetElement, visible: bool) {
        self.visible.insert(element, visible);
    }

    fn inline_style(&self, property: StyleProperty) -> String {
        self.style(property).to_owned()
    }

    fn set_inline_style(&mut self, property: StyleProperty, value: &str) {
        if value.is_empty() {
            self.styles.remove(&property);
        } else {
            self.styles.insert(property, value.to_owned());
        }
    }

    fn scroll_to(&mut self, offset: f64) {
        self.scroll_log.push(offset);
        self.metrics.scroll_offset = offset;
    }

    fn create_content_surface(&mut self) -> bool {
        if self.reject_surfaces {
            return false;
        }
        self.surfaces_created += 1;
        self.surface = Some(HeadlessSurface::default());
        true
    }

    fn set_content_address(&mut self, address: &str) {
        if let Some(surface) = &mut self.surface {
            surface.address = address.to_owned();
            self.address_log.push(address.to_owned());
        }
    }

    fn set_content_hidden(&mut self, hidden: bool) {
        if let Some(surface) = &mut self.surface {
            surface.hidden = hidden;
        }
    }
}
