#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Selectable menus and the paginated grid container that presents them.

use battle_engine_core::{Color, FontKey, Rect, Renderer, TextParams};
use glam::Vec2;

/// What a menu item does when it is confirmed.
#[derive(Clone, Debug, PartialEq)]
pub enum MenuEntry<A> {
    /// Runs the bound action.
    Action(A),
    /// Opens a nested menu.
    Submenu(Menu<A>),
}

/// Display text paired with its entry.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuItem<A> {
    text: String,
    entry: MenuEntry<A>,
}

impl<A> MenuItem<A> {
    /// Creates an item running `action`.
    #[must_use]
    pub fn action(text: impl Into<String>, action: A) -> Self {
        Self {
            text: text.into(),
            entry: MenuEntry::Action(action),
        }
    }

    /// Creates an item opening `submenu`.
    #[must_use]
    pub fn submenu(text: impl Into<String>, submenu: Menu<A>) -> Self {
        Self {
            text: text.into(),
            entry: MenuEntry::Submenu(submenu),
        }
    }

    /// Text shown for the item.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Entry confirmed by the item.
    #[must_use]
    pub fn entry(&self) -> &MenuEntry<A> {
        &self.entry
    }
}

/// Ordered list of items with a selection.
///
/// Items are identified by position. The selection always lies inside the
/// item range, or is zero for an empty menu.
#[derive(Clone, Debug, PartialEq)]
pub struct Menu<A> {
    title: String,
    items: Vec<MenuItem<A>>,
    selected: usize,
}

impl<A> Menu<A> {
    /// Creates an empty menu.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            selected: 0,
        }
    }

    /// Appends an item.
    #[must_use]
    pub fn with_item(mut self, item: MenuItem<A>) -> Self {
        self.items.push(item);
        self
    }

    /// Appends an item in place.
    pub fn push(&mut self, item: MenuItem<A>) {
        self.items.push(item);
    }

    /// Title of the menu.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Items in display order.
    #[must_use]
    pub fn items(&self) -> &[MenuItem<A>] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the menu has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the selected item.
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Currently selected item, `None` for an empty menu.
    #[must_use]
    pub fn selected_item(&self) -> Option<&MenuItem<A>> {
        self.items.get(self.selected)
    }

    /// Selects `index`, clamped into the item range.
    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.items.len().saturating_sub(1));
    }
}

/// Object moved to the on-screen position of the selected item.
pub trait CursorIndicator {
    /// Moves the indicator so it points at `position`.
    fn move_to(&mut self, position: Vec2);
}

/// Geometry of a menu container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuLayout {
    /// Area the items are laid out in.
    pub rect: Rect,
    /// Number of columns, at least one.
    pub columns: usize,
    /// Vertical gap between rows.
    pub item_spacing: f32,
    /// Font size of item text.
    pub font_size: u16,
    /// Font face of item text.
    pub font: FontKey,
    /// Height of one line of item text.
    pub line_height: f32,
    /// Horizontal offset of item text from its slot, leaving room for the cursor.
    pub text_indent: f32,
}

impl MenuLayout {
    /// Creates a single-column layout.
    #[must_use]
    pub fn new(rect: Rect, font_size: u16, line_height: f32) -> Self {
        Self {
            rect,
            columns: 1,
            item_spacing: 0.0,
            font_size,
            font: FontKey::DtmSans,
            line_height,
            text_indent: 0.0,
        }
    }

    /// Overrides the column count; zero is treated as one.
    #[must_use]
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Overrides the gap between rows.
    #[must_use]
    pub fn with_item_spacing(mut self, item_spacing: f32) -> Self {
        self.item_spacing = item_spacing;
        self
    }

    /// Overrides the text indent.
    #[must_use]
    pub fn with_text_indent(mut self, text_indent: f32) -> Self {
        self.text_indent = text_indent;
        self
    }

    /// Overrides the font face.
    #[must_use]
    pub fn with_font(mut self, font: FontKey) -> Self {
        self.font = font;
        self
    }

    fn row_height(&self) -> f32 {
        self.line_height + self.item_spacing
    }

    fn rows(&self) -> usize {
        let row_height = self.row_height();
        if row_height <= 0.0 || self.rect.height <= 0.0 {
            return 0;
        }
        // Truncation keeps only fully visible rows.
        (self.rect.height / row_height).floor() as usize
    }
}

/// Paginated grid presentation of a [`Menu`].
///
/// Items fill a page column by column: the first `rows` items form the first
/// column, the next `rows` the second, and so on. Every derived quantity is
/// recomputed from the layout on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuContainer<A> {
    menu: Menu<A>,
    layout: MenuLayout,
}

impl<A> MenuContainer<A> {
    /// Wraps `menu` in a container with `layout`.
    #[must_use]
    pub fn new(menu: Menu<A>, layout: MenuLayout) -> Self {
        Self {
            menu,
            layout: layout.with_columns(layout.columns),
        }
    }

    /// Menu being presented.
    #[must_use]
    pub fn menu(&self) -> &Menu<A> {
        &self.menu
    }

    /// Layout in use.
    #[must_use]
    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    /// Replaces the layout, keeping the selection.
    pub fn set_layout(&mut self, layout: MenuLayout) {
        self.layout = layout.with_columns(layout.columns);
    }

    /// Number of items that fit on one page.
    #[must_use]
    pub fn items_per_page(&self) -> usize {
        self.layout.rows() * self.layout.columns
    }

    /// Number of items stacked in one column of a page.
    #[must_use]
    pub fn items_per_column(&self) -> usize {
        self.items_per_page() / self.layout.columns
    }

    /// Number of pages, zero when nothing can be shown.
    #[must_use]
    pub fn page_count(&self) -> usize {
        match self.items_per_page() {
            0 => 0,
            per_page => self.menu.len().div_ceil(per_page),
        }
    }

    /// One-indexed page holding the selected item.
    #[must_use]
    pub fn current_page(&self) -> usize {
        match self.items_per_page() {
            0 => 1,
            per_page => self.menu.selected_index() / per_page + 1,
        }
    }

    /// Items shown on one-indexed `page`; empty when the page does not exist.
    #[must_use]
    pub fn get_items_for_page(&self, page: usize) -> &[MenuItem<A>] {
        let per_page = self.items_per_page();
        if page == 0 || per_page == 0 {
            return &[];
        }
        let items = self.menu.items();
        let start = ((page - 1) * per_page).min(items.len());
        let end = (start + per_page).min(items.len());
        &items[start..end]
    }

    /// Selects `index`, clamped, and moves `indicator` onto it.
    pub fn select_item(&mut self, index: usize, indicator: &mut dyn CursorIndicator) {
        self.menu.select(index);
        indicator.move_to(self.cursor_position());
    }

    /// Moves the selection one column left or right, staying on the same row.
    pub fn select_next_in_row(&mut self, direction: i32, indicator: &mut dyn CursorIndicator) {
        let step = self.items_per_column();
        if step == 0 || self.menu.is_empty() {
            return;
        }
        let current = self.menu.selected_index();
        let target = if direction < 0 {
            current.saturating_sub(step)
        } else {
            current + step
        };
        self.select_item(target, indicator);
    }

    /// Moves the selection up or down, wrapping within the current column.
    pub fn select_next_in_column(&mut self, direction: i32, indicator: &mut dyn CursorIndicator) {
        let rows = self.items_per_column();
        let count = self.menu.len();
        if rows == 0 || count == 0 {
            return;
        }
        let current = self.menu.selected_index();
        let start = current / rows * rows;
        let end = (start + rows).min(count);
        let len = end - start;
        // Column length never exceeds the page, so the offset fits in i64.
        let offset = (current - start) as i64 + i64::from(direction.signum());
        let wrapped = offset.rem_euclid(len as i64) as usize;
        self.select_item(start + wrapped, indicator);
    }

    /// Top-left corner of the slot holding the selected item.
    ///
    /// Falls back to the layout origin when nothing can be shown.
    #[must_use]
    pub fn cursor_position(&self) -> Vec2 {
        let rows = self.items_per_column();
        if rows == 0 || self.menu.is_empty() {
            return self.layout.rect.origin();
        }
        let on_page = self.menu.selected_index() % self.items_per_page();
        self.slot_position(on_page, rows)
    }

    fn slot_position(&self, slot: usize, rows: usize) -> Vec2 {
        let column_width = self.layout.rect.width / self.layout.columns as f32;
        let mut position = self.layout.rect.origin();
        for _ in 0..slot % rows {
            position.y += self.layout.row_height();
        }
        position.x += column_width * (slot / rows) as f32;
        position
    }

    /// Draws the items of the current page.
    pub fn render(&self, renderer: &mut dyn Renderer, color: Color) {
        let rows = self.items_per_column();
        if rows == 0 {
            return;
        }
        let params = TextParams::new(self.layout.font_size, color).with_font(self.layout.font);
        let indent = Vec2::new(self.layout.text_indent, 0.0);
        for (slot, item) in self
            .get_items_for_page(self.current_page())
            .iter()
            .enumerate()
        {
            renderer.draw_text(item.text(), params, self.slot_position(slot, rows) + indent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pointer(Vec2);

    impl CursorIndicator for Pointer {
        fn move_to(&mut self, position: Vec2) {
            self.0 = position;
        }
    }

    fn menu(count: usize) -> Menu<usize> {
        (0..count).fold(Menu::new("test"), |menu, index| {
            menu.with_item(MenuItem::action(format!("item {index}"), index))
        })
    }

    #[test]
    fn select_clamps_into_range() {
        let mut menu = menu(3);
        menu.select(10);
        assert_eq!(menu.selected_index(), 2);

        let mut empty = Menu::<usize>::new("empty");
        empty.select(4);
        assert_eq!(empty.selected_index(), 0);
        assert!(empty.selected_item().is_none());
    }

    #[test]
    fn rows_fit_height_with_spacing() {
        let layout = MenuLayout::new(Rect::new(0.0, 0.0, 200.0, 95.0), 20, 20.0)
            .with_item_spacing(10.0)
            .with_columns(2);
        let container = MenuContainer::new(menu(7), layout);

        assert_eq!(container.items_per_column(), 3);
        assert_eq!(container.items_per_page(), 6);
        assert_eq!(container.page_count(), 2);
        assert_eq!(container.get_items_for_page(2).len(), 1);
        assert!(container.get_items_for_page(3).is_empty());
    }

    #[test]
    fn zero_columns_are_treated_as_one() {
        let mut layout = MenuLayout::new(Rect::new(0.0, 0.0, 100.0, 100.0), 20, 20.0);
        layout.columns = 0;
        let container = MenuContainer::new(menu(2), layout);

        assert_eq!(container.layout().columns, 1);
        assert_eq!(container.items_per_page(), 5);
    }

    #[test]
    fn cursor_flows_into_second_column() {
        let layout = MenuLayout::new(Rect::new(10.0, 20.0, 200.0, 60.0), 20, 20.0).with_columns(2);
        let mut container = MenuContainer::new(menu(6), layout);
        let mut pointer = Pointer(Vec2::ZERO);

        container.select_item(4, &mut pointer);

        assert_eq!(pointer.0, Vec2::new(110.0, 40.0));
    }
}
