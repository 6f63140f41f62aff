use battle_engine_core::{Color, Rect};
use battle_engine_rendering::RecordingRenderer;
use battle_engine_system_menu::{CursorIndicator, Menu, MenuContainer, MenuItem, MenuLayout};
use glam::Vec2;

#[derive(Default)]
struct Pointer {
    position: Vec2,
    moves: usize,
}

impl CursorIndicator for Pointer {
    fn move_to(&mut self, position: Vec2) {
        self.position = position;
        self.moves += 1;
    }
}

fn container(count: usize, columns: usize, height: f32) -> MenuContainer<usize> {
    let menu = (0..count).fold(Menu::new("enemies"), |menu, index| {
        menu.with_item(MenuItem::action(format!("* Enemy {index}"), index))
    });
    let layout = MenuLayout::new(Rect::new(40.0, 250.0, 560.0, height), 20, 20.0)
        .with_item_spacing(5.0)
        .with_columns(columns);
    MenuContainer::new(menu, layout)
}

#[test]
fn single_column_wraps_from_last_to_first() {
    let mut container = container(4, 1, 100.0);
    let mut pointer = Pointer::default();
    container.select_item(3, &mut pointer);

    container.select_next_in_column(1, &mut pointer);

    assert_eq!(container.menu().selected_index(), 0);
    assert_eq!(pointer.position, Vec2::new(40.0, 250.0));
}

#[test]
fn column_wraps_upward_from_first_to_last() {
    let mut container = container(4, 1, 100.0);
    let mut pointer = Pointer::default();

    container.select_next_in_column(-1, &mut pointer);

    assert_eq!(container.menu().selected_index(), 3);
    assert_eq!(pointer.position, Vec2::new(40.0, 325.0));
}

#[test]
fn short_last_column_wraps_within_its_own_range() {
    // Four rows per column: the second column holds indices 4 and 5 only.
    let mut container = container(6, 2, 100.0);
    let mut pointer = Pointer::default();
    container.select_item(5, &mut pointer);

    container.select_next_in_column(1, &mut pointer);

    assert_eq!(container.menu().selected_index(), 4);
}

#[test]
fn row_steps_round_trip_inside_a_page() {
    let mut container = container(8, 2, 100.0);
    let mut pointer = Pointer::default();
    container.select_item(1, &mut pointer);
    let before = pointer.position;

    container.select_next_in_row(1, &mut pointer);
    assert_eq!(container.menu().selected_index(), 5);
    assert_eq!(pointer.position, before + Vec2::new(280.0, 0.0));

    container.select_next_in_row(-1, &mut pointer);
    assert_eq!(container.menu().selected_index(), 1);
    assert_eq!(pointer.position, before);
}

#[test]
fn row_step_past_the_end_clamps_to_last_item() {
    let mut container = container(6, 2, 100.0);
    let mut pointer = Pointer::default();
    container.select_item(3, &mut pointer);

    container.select_next_in_row(1, &mut pointer);

    assert_eq!(container.menu().selected_index(), 5);
}

#[test]
fn selection_on_a_later_page_uses_page_relative_slots() {
    let mut container = container(10, 1, 100.0);
    let mut pointer = Pointer::default();

    container.select_item(5, &mut pointer);

    assert_eq!(container.current_page(), 2);
    assert_eq!(container.page_count(), 3);
    assert_eq!(pointer.position, Vec2::new(40.0, 275.0));
    assert_eq!(
        container
            .get_items_for_page(2)
            .iter()
            .map(MenuItem::text)
            .collect::<Vec<_>>(),
        vec!["* Enemy 4", "* Enemy 5", "* Enemy 6", "* Enemy 7"]
    );
}

#[test]
fn zero_height_layout_degrades_to_no_op() {
    let mut container = container(3, 1, 0.0);
    let mut pointer = Pointer::default();

    container.select_next_in_column(1, &mut pointer);
    container.select_next_in_row(1, &mut pointer);

    assert_eq!(container.items_per_page(), 0);
    assert_eq!(container.page_count(), 0);
    assert_eq!(container.menu().selected_index(), 0);
    assert_eq!(container.cursor_position(), Vec2::new(40.0, 250.0));
    assert_eq!(pointer.moves, 0);
}

#[test]
fn empty_menu_keeps_selection_at_zero() {
    let mut container = container(0, 2, 100.0);
    let mut pointer = Pointer::default();

    container.select_next_in_column(1, &mut pointer);
    container.select_item(7, &mut pointer);

    assert_eq!(container.menu().selected_index(), 0);
    assert_eq!(pointer.position, Vec2::new(40.0, 250.0));
}

#[test]
fn render_draws_only_the_current_page() {
    let mut container = container(6, 1, 50.0);
    let mut pointer = Pointer::default();
    container.select_item(3, &mut pointer);
    let mut renderer = RecordingRenderer::new();

    container.render(&mut renderer, Color::WHITE);

    assert_eq!(
        renderer.texts().collect::<Vec<_>>(),
        vec!["* Enemy 2", "* Enemy 3"]
    );
}
