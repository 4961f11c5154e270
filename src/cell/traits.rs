//! Cell traits: The capability every list cell variant provides.
//!
//! A cell wraps a host widget ([`CellContent`]) and gives it a place in a list:
//! it is attached to a container once, receives typed state, and can be
//! measured. Variants differ only in how they size their content.

/// Width and height, in host units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Size {
    /// Zero size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Upper bounds for measuring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Maximum width (may be infinite).
    pub max_width: f32,
    /// Maximum height (may be infinite).
    pub max_height: f32,
}

impl Constraints {
    /// No limit in either direction.
    pub const UNBOUNDED: Self = Self::new(f32::INFINITY, f32::INFINITY);

    /// Create new constraints.
    #[inline]
    pub const fn new(max_width: f32, max_height: f32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Limit only the width, as a vertical list does.
    #[inline]
    pub const fn width(max_width: f32) -> Self {
        Self::new(max_width, f32::INFINITY)
    }

    /// Clamp `size` to these constraints.
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(size.width.min(self.max_width), size.height.min(self.max_height))
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Identifies the list or grid container a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

/// The kind of container a cell variant is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// A full-width row of a table.
    TableRow,
    /// An item of a grid or collection.
    GridCell,
}

/// The host widget wrapped by a cell.
pub trait CellContent {
    /// The state this widget displays.
    type State;

    /// Display `state`.
    fn apply_state(&mut self, state: &Self::State);

    /// The size that best fits within `constraints`.
    fn size_that_fits(&self, constraints: Constraints) -> Size;
}

/// A cell that can show one item of a list.
pub trait ListCell {
    /// The state the cell displays.
    type State;

    /// Attach the cell to `container`.
    ///
    /// Only the first call has an effect; returns whether it did.
    fn attach(&mut self, container: ContainerId) -> bool;

    /// The container this cell is attached to, if any.
    fn container(&self) -> Option<ContainerId>;

    /// Display `state`.
    fn apply_state(&mut self, state: &Self::State);

    /// Measure the cell within `constraints`.
    fn measure(&self, constraints: Constraints) -> Size;

    /// Which variant this is.
    fn kind(&self) -> CellKind;
}
