use egui::Pos2;
use image::Rgba;
use note_sketch::{AppConfig, DrawingSession, HistoryStack, PixelSurface, Tool};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn session(width: i64, height: i64) -> DrawingSession {
    let surface = PixelSurface::allocate(width, height).unwrap();
    DrawingSession::new(surface, &AppConfig::default()).unwrap()
}

// One complete pencil drag
fn stroke(session: &mut DrawingSession, from: (f32, f32), to: (f32, f32)) {
    session.begin_gesture(Pos2::new(from.0, from.1)).unwrap();
    session.move_gesture(Pos2::new(to.0, to.1)).unwrap();
    session.end_gesture().unwrap();
}

#[test]
fn test_stroke_undo_redo_on_blank_canvas() {
    let mut session = session(100, 100);
    session.select_tool(Tool::Pencil).unwrap();
    assert!(!session.can_undo());

    stroke(&mut session, (10.0, 10.0), (90.0, 10.0));
    assert_eq!(session.surface().pixel(50, 10), Some(BLACK));
    assert!(session.can_undo());

    assert!(session.undo().unwrap());
    assert_eq!(session.surface().pixel(50, 10), Some(WHITE));
    assert!(session.surface().image().pixels().all(|px| *px == WHITE));
    assert!(session.can_redo());

    assert!(session.redo().unwrap());
    assert_eq!(session.surface().pixel(50, 10), Some(BLACK));
    assert!(!session.can_redo());
}

#[test]
fn test_undo_every_edit_restores_initial_pixels() {
    let mut session = session(100, 100);
    let initial = session.surface().as_raw().to_vec();

    for i in 0..10 {
        let y = 5.0 + i as f32 * 9.0;
        stroke(&mut session, (5.0, y), (95.0, y));
    }
    let drawn = session.surface().as_raw().to_vec();
    assert_ne!(drawn, initial);

    for _ in 0..10 {
        assert!(session.undo().unwrap());
    }
    assert_eq!(session.surface().as_raw(), &initial[..]);
    assert!(!session.undo().unwrap(), "the base entry is never undone");

    for _ in 0..10 {
        assert!(session.redo().unwrap());
    }
    assert_eq!(session.surface().as_raw(), &drawn[..]);
}

#[test]
fn test_undo_mixed_edits_near_capacity() {
    let mut session = session(100, 100);
    session.set_line_width(3.0);
    session.set_font_size(16.0);
    let initial = session.surface().as_raw().to_vec();

    let mut i = 0u8;
    while session.history().undo_len() < 49 {
        let offset = (i % 20) as f32 * 4.0;
        match i % 6 {
            0 => {
                session.select_tool(Tool::Brush).unwrap();
                stroke(&mut session, (5.0, 5.0 + offset), (95.0, 90.0 - offset));
            }
            1 => {
                session.select_tool(Tool::Rectangle).unwrap();
                stroke(&mut session, (10.0 + offset, 10.0), (60.0, 60.0 + offset / 2.0));
            }
            2 => {
                session.select_tool(Tool::Circle).unwrap();
                stroke(&mut session, (20.0, 20.0), (50.0 + offset / 2.0, 70.0));
            }
            3 => {
                session.select_tool(Tool::Fill).unwrap();
                session.set_color([i.wrapping_mul(5), 100, 200, 255]);
                session.begin_gesture(Pos2::new(98.0, 1.0)).unwrap();
                session.end_gesture().unwrap();
                session.set_color([0, 0, 0, 255]);
            }
            4 => {
                session.select_tool(Tool::Text).unwrap();
                session.begin_gesture(Pos2::new(5.0, offset)).unwrap();
                session.end_gesture().unwrap();
                session.text_input_mut().unwrap().push_str("note");
                session.commit_text().unwrap();
            }
            _ => session.clear().unwrap(),
        }
        i += 1;
    }
    let edits = session.history().undo_len() - 1;
    assert!(edits >= 48);
    let last = session.surface().as_raw().to_vec();

    for _ in 0..edits {
        assert!(session.undo().unwrap());
    }
    assert!(!session.undo().unwrap());
    assert_eq!(session.surface().as_raw(), &initial[..]);

    for _ in 0..edits {
        assert!(session.redo().unwrap());
    }
    assert_eq!(session.surface().as_raw(), &last[..]);
}

#[test]
fn test_new_edit_discards_redo_branch() {
    let mut session = session(50, 50);
    stroke(&mut session, (5.0, 5.0), (45.0, 5.0));
    stroke(&mut session, (5.0, 20.0), (45.0, 20.0));
    session.undo().unwrap();
    assert!(session.can_redo());

    stroke(&mut session, (5.0, 40.0), (45.0, 40.0));
    assert!(!session.can_redo());
    assert!(!session.redo().unwrap());
    assert_eq!(session.surface().pixel(25, 20), Some(WHITE));
    assert_eq!(session.surface().pixel(25, 40), Some(BLACK));
}

#[test]
fn test_capacity_keeps_most_recent_entries() {
    let mut surface = PixelSurface::allocate(70, 1).unwrap();
    let mut history = HistoryStack::new(&surface, 50).unwrap();

    for x in 0..60 {
        surface.set_pixel(x, 0, BLACK);
        assert!(history.snapshot(&surface).unwrap());
    }
    assert_eq!(history.undo_len(), 50);

    for _ in 0..49 {
        assert!(history.undo(&mut surface).unwrap());
    }
    assert!(!history.undo(&mut surface).unwrap());

    // the oldest surviving entry holds the 11th edit
    assert_eq!(surface.pixel(10, 0), Some(BLACK));
    assert_eq!(surface.pixel(11, 0), Some(WHITE));
}

#[test]
fn test_clear_is_one_undoable_edit() {
    let mut session = session(40, 40);
    stroke(&mut session, (0.0, 20.0), (40.0, 20.0));
    let drawn = session.surface().as_raw().to_vec();

    session.clear().unwrap();
    assert!(session.surface().image().pixels().all(|px| *px == WHITE));
    assert_eq!(session.history().undo_len(), 3);

    session.undo().unwrap();
    assert_eq!(session.surface().as_raw(), &drawn[..]);
}

#[test]
fn test_history_changed_events_follow_edits() {
    use note_sketch::DrawingEvent;
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut session = session(30, 30);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session
        .events()
        .subscribe(move |event: &DrawingEvent| sink.borrow_mut().push(event.clone()));

    stroke(&mut session, (0.0, 5.0), (30.0, 5.0));
    session.undo().unwrap();

    let events = seen.borrow();
    assert_eq!(
        events.as_slice(),
        &[
            DrawingEvent::HistoryChanged { can_undo: true, can_redo: false },
            DrawingEvent::HistoryChanged { can_undo: false, can_redo: true },
        ]
    );
}
