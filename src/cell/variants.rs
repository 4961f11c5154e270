//! Cell variants: Table rows and grid cells.

use super::traits::{CellContent, CellKind, Constraints, ContainerId, ListCell, Size};

/// A full-width table row wrapping `C`.
///
/// Rows take the whole available width; only their height comes from the
/// content.
#[derive(Debug, Clone)]
pub struct TableRowCell<C> {
    content: C,
    container: Option<ContainerId>,
}

/// A grid item wrapping `C`, sized by its content.
#[derive(Debug, Clone)]
pub struct GridCell<C> {
    content: C,
    container: Option<ContainerId>,
}

/// Everything the variants share; each provides `KIND` and `fit`.
macro_rules! impl_cell_common {
    ($cell:ident) => {
        impl<C> $cell<C> {
            /// Wrap `content`.
            pub const fn new(content: C) -> Self {
                Self {
                    content,
                    container: None,
                }
            }

            /// The wrapped content.
            #[inline]
            pub const fn content(&self) -> &C {
                &self.content
            }

            /// The wrapped content, mutably.
            #[inline]
            pub fn content_mut(&mut self) -> &mut C {
                &mut self.content
            }

            /// Consume the cell, returning the content.
            pub fn into_content(self) -> C {
                self.content
            }
        }

        impl<C: CellContent> ListCell for $cell<C> {
            type State = C::State;

            fn attach(&mut self, container: ContainerId) -> bool {
                if self.container.is_some() {
                    return false;
                }
                self.container = Some(container);
                true
            }

            fn container(&self) -> Option<ContainerId> {
                self.container
            }

            fn apply_state(&mut self, state: &C::State) {
                self.content.apply_state(state);
            }

            fn measure(&self, constraints: Constraints) -> Size {
                Self::fit(self.content.size_that_fits(constraints), constraints)
            }

            fn kind(&self) -> CellKind {
                Self::KIND
            }
        }
    };
}

impl_cell_common!(TableRowCell);
impl_cell_common!(GridCell);

impl<C> TableRowCell<C> {
    const KIND: CellKind = CellKind::TableRow;

    fn fit(fitted: Size, constraints: Constraints) -> Size {
        let width = if constraints.max_width.is_finite() {
            constraints.max_width
        } else {
            fitted.width
        };
        Size::new(width, fitted.height.min(constraints.max_height))
    }
}

impl<C> GridCell<C> {
    const KIND: CellKind = CellKind::GridCell;

    fn fit(fitted: Size, constraints: Constraints) -> Size {
        constraints.clamp(fitted)
    }
}
