//! Core value types shared by the geometry engine and the controller

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CalloutError;

/// A point in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle, edges in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from its origin and size
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            right: origin.x + size.width,
            bottom: origin.y + size.height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    /// Grow the rectangle by `amount` on every side (negative shrinks)
    pub fn inset_by(&self, amount: f32) -> Self {
        Self {
            left: self.left - amount,
            top: self.top - amount,
            right: self.right + amount,
            bottom: self.bottom + amount,
        }
    }

    /// Shift the rectangle so that `origin` becomes (0, 0)
    pub fn relative_to(&self, origin: Point) -> Self {
        Self {
            left: self.left - origin.x,
            top: self.top - origin.y,
            right: self.right - origin.x,
            bottom: self.bottom - origin.y,
        }
    }

    /// Half-open containment: left/top edges inclusive, right/bottom exclusive
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// True when the two rectangles share interior area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Side of the anchor the callout attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Gravity {
    #[default]
    Top,
    Bottom,
    Start,
    End,
    Center,
}

impl Gravity {
    /// Direction the arrow points, drawn on the callout edge facing the anchor
    pub fn arrow_direction(self) -> ArrowDirection {
        match self {
            Self::Start => ArrowDirection::Right,
            Self::End => ArrowDirection::Left,
            Self::Top => ArrowDirection::Bottom,
            Self::Bottom => ArrowDirection::Top,
            Self::Center => ArrowDirection::Top,
        }
    }

    /// Whether the callout sits above or below the anchor
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl FromStr for Gravity {
    type Err = CalloutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "start" | "left" => Ok(Self::Start),
            "end" | "right" => Ok(Self::End),
            "center" | "centre" => Ok(Self::Center),
            _ => Err(CalloutError::InvalidGravity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Gravity {
    type Error = CalloutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Start => "start",
            Self::End => "end",
            Self::Center => "center",
        };
        f.write_str(name)
    }
}

/// Edge of the callout the arrow is drawn on
///
/// ```text
///  Top      Bottom    Left    Right
///   /\     ╭─────╮   ╭───╮    ╭───╮
/// ╭────╮   ╰─\/──╯  <│   │    │   │>
/// ╰────╯             ╰───╯    ╰───╯
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ArrowDirection {
    Left,
    Top,
    Right,
    Bottom,
}

impl ArrowDirection {
    /// Arrows on the top or bottom edge slide horizontally
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// Orient an arrow given as (base width, tip height)
    ///
    /// Top/bottom arrows keep the size as is, left/right arrows are rotated
    /// so their base runs vertically.
    pub fn oriented(self, arrow_width: f32, arrow_height: f32) -> Size {
        if self.is_horizontal() {
            Size::new(arrow_width, arrow_height)
        } else {
            Size::new(arrow_height, arrow_width)
        }
    }
}

impl FromStr for ArrowDirection {
    type Err = CalloutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "top" | "up" => Ok(Self::Top),
            "right" => Ok(Self::Right),
            "bottom" | "down" => Ok(Self::Bottom),
            _ => Err(CalloutError::InvalidArrowDirection(s.to_string())),
        }
    }
}

impl TryFrom<String> for ArrowDirection {
    type Error = CalloutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Shape of the hole cut into the dimmed overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum HighlightShape {
    #[default]
    Oval,
    Rectangle,
}

impl FromStr for HighlightShape {
    type Err = CalloutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oval" | "ellipse" => Ok(Self::Oval),
            "rectangle" | "rect" | "rectangular" => Ok(Self::Rectangle),
            _ => Err(CalloutError::InvalidHighlightShape(s.to_string())),
        }
    }
}

impl TryFrom<String> for HighlightShape {
    type Error = CalloutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the callout displays
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Plain text, laid out by the host's default text view
    Text(String),
    /// Host-built content, referenced by handle
    Custom(ContentId),
}

/// Opaque handle to host-built content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId(pub u64);
