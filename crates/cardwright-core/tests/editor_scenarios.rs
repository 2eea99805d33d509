//! Integration tests: editor session, interaction controller and persistence
//! working together through the public API.

use cardwright_core::layer::COPY_SUFFIX;
use cardwright_core::storage::{AutoSaveOutcome, NewDesign};
use cardwright_core::{
    DesignBackend, DesignSession, Editor, EditorConfig, Geometry, InteractionController, Layer,
    LayerId, LayerKind, LayerPatch, MemoryBackend, MoveDirection, NewLayer, PageSize, PointerEvent,
    PointerOutcome, PropsPatch, StyleProps, TemplateDescriptor,
};
use kurbo::Point;
use pollster::block_on;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn text(content: &str) -> NewLayer {
    NewLayer::new(LayerKind::Text).with_props(PropsPatch::style(StyleProps {
        text: Some(content.into()),
        ..StyleProps::default()
    }))
}

fn layers_json(editor: &Editor) -> String {
    serde_json::to_string(editor.layers()).unwrap()
}

fn a4_controller() -> InteractionController {
    InteractionController::for_template(&TemplateDescriptor::new("boda-a4", PageSize::A4))
}

// ─── Store scenario ─────────────────────────────────────────────────────

#[test]
fn add_duplicate_reorder_then_undo_to_empty() {
    let mut editor = Editor::default();

    let first = editor.add_layer(text("Hi"));
    assert_eq!(first, 1);
    assert_eq!(editor.selected_id(), Some(1));

    let copy = editor.duplicate_layer(first).unwrap();
    assert_eq!(copy, 2);
    assert_eq!(editor.selected_id(), Some(2));
    let (original, duplicate) = (editor.layer(1).unwrap(), editor.layer(2).unwrap());
    assert_eq!(duplicate.geometry().x, original.geometry().x + 20.0);
    assert_eq!(duplicate.geometry().y, original.geometry().y + 20.0);
    assert_eq!(duplicate.name, format!("{}{COPY_SUFFIX}", original.name));
    assert_eq!(duplicate.props.style.text.as_deref(), Some("Hi"));

    assert!(editor.move_layer(2, MoveDirection::Down));
    assert_eq!(editor.document().ids(), vec![2, 1]);

    for _ in 0..3 {
        assert!(editor.undo());
    }
    assert!(editor.layers().is_empty());
    assert!(!editor.can_undo());
}

#[test]
fn ids_stay_unique_across_adds_duplicates_and_undo() {
    let mut editor = Editor::default();
    let mut seen: HashSet<LayerId> = HashSet::new();

    for round in 0..5 {
        let id = editor.add_layer(text(&format!("t{round}")));
        assert!(seen.insert(id));
        let copy = editor.duplicate_layer(id).unwrap();
        assert!(seen.insert(copy));
        if round % 2 == 0 {
            editor.undo();
        }
    }

    let ids = editor.document().ids();
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn undo_and_redo_restore_exact_layer_sequences() {
    let mut editor = Editor::default();
    let id = editor.add_layer(text("Hi"));
    editor.add_layer(NewLayer::new(LayerKind::Image));

    let mutations: Vec<Box<dyn Fn(&mut Editor)>> = vec![
        Box::new(move |e| {
            e.update_layer(id, &LayerPatch::props(PropsPatch::position(5.0, 7.0)));
        }),
        Box::new(move |e| {
            e.toggle_layer_lock(id);
        }),
        Box::new(move |e| {
            e.move_layer(id, MoveDirection::Up);
        }),
        Box::new(move |e| {
            e.duplicate_layer(id);
        }),
        Box::new(move |e| {
            e.delete_layer(id);
        }),
    ];

    for mutate in mutations {
        let before = layers_json(&editor);
        mutate(&mut editor);
        let after = layers_json(&editor);
        assert_ne!(before, after);

        assert!(editor.undo());
        assert_eq!(layers_json(&editor), before);
        assert!(editor.redo());
        assert_eq!(layers_json(&editor), after);
    }
}

#[test]
fn new_mutation_after_undo_discards_redo_branch() {
    let mut editor = Editor::default();
    let a = editor.add_layer(text("a"));
    editor.add_layer(text("b"));
    assert_eq!(editor.history().len(), 3);

    editor.undo();
    let c = editor.add_layer(text("c"));

    let history = editor.history();
    assert_eq!(history.len(), 3);
    assert!(!editor.can_redo());
    let ids: Vec<LayerId> = history.snapshots()[2].layers.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![a, c]);
}

#[test]
fn reorder_is_noop_at_stack_ends() {
    let mut editor = Editor::default();
    let bottom = editor.add_layer(text("bottom"));
    let top = editor.add_layer(text("top"));
    let history_len = editor.history().len();
    editor.take_events();

    assert!(!editor.move_layer(top, MoveDirection::Up));
    assert!(!editor.move_layer(bottom, MoveDirection::Down));
    assert_eq!(editor.document().ids(), vec![bottom, top]);
    assert_eq!(editor.history().len(), history_len);
    assert!(editor.take_events().is_empty());
}

#[test]
fn history_is_capped() {
    let config = EditorConfig {
        history_limit: 5,
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(config);
    for i in 0..10 {
        editor.add_layer(text(&i.to_string()));
    }

    assert_eq!(editor.history().len(), 5);
    let mut undone = 0;
    while editor.undo() {
        undone += 1;
    }
    assert_eq!(undone, 4);
    assert_eq!(editor.layers().len(), 6);
}

// ─── Pointer interaction ────────────────────────────────────────────────

#[test]
fn drag_is_clamped_to_the_canvas() {
    let mut editor = Editor::default();
    let id = editor.add_layer(NewLayer::new(LayerKind::Shape));
    assert_eq!(editor.layer(id).unwrap().geometry(), Geometry::new(100.0, 100.0, 200.0, 50.0));
    let mut controller = a4_controller();

    let down = controller.handle_event(&mut editor, PointerEvent::down(110.0, 110.0));
    assert_eq!(down, PointerOutcome::DragStarted(id));

    controller.handle_event(&mut editor, PointerEvent::moved(-40.0, 110.0));
    assert_eq!(editor.layer(id).unwrap().geometry().x, 0.0);

    controller.handle_event(&mut editor, PointerEvent::moved(310.0, 110.0));
    assert_eq!(editor.layer(id).unwrap().geometry().x, 220.0);

    let up = controller.handle_event(&mut editor, PointerEvent::up(310.0, 110.0));
    assert_eq!(up, PointerOutcome::GestureEnded);
    assert!(!controller.is_active());

    // One entry for the whole drag.
    assert_eq!(editor.history().undo_label(), Some("Move layer"));
    editor.undo();
    assert_eq!(editor.layer(id).unwrap().geometry().x, 100.0);
}

#[test]
fn layer_added_mid_drag_is_undone_separately() {
    let mut editor = Editor::default();
    let id = editor.add_layer(NewLayer::new(LayerKind::Shape));
    let mut controller = a4_controller();
    let len = editor.history().len();

    controller.handle_event(&mut editor, PointerEvent::down(110.0, 110.0));
    controller.handle_event(&mut editor, PointerEvent::moved(160.0, 110.0));
    let added = editor.add_layer(text("Hola"));
    controller.handle_event(&mut editor, PointerEvent::up(160.0, 110.0));

    assert_eq!(editor.history().len(), len + 2);
    assert!(editor.undo());
    assert!(editor.layer(added).is_none());
    assert_eq!(editor.layer(id).unwrap().geometry().x, 150.0);
    assert!(editor.undo());
    assert_eq!(editor.layer(id).unwrap().geometry().x, 100.0);
}

#[test]
fn drag_follows_zoom() {
    let mut editor = Editor::default();
    let id = editor.add_layer(NewLayer::new(LayerKind::Shape));
    editor.set_zoom(2.0);
    let mut controller = a4_controller();
    controller.set_canvas_origin(Point::new(50.0, 50.0));

    // Canvas (110, 110) sits at screen 50 + 110 * 2.
    controller.pointer_down(&mut editor, Point::new(270.0, 270.0));
    controller.pointer_move(&mut editor, Point::new(290.0, 250.0));
    controller.pointer_up(&mut editor);

    let geometry = editor.layer(id).unwrap().geometry();
    assert_eq!((geometry.x, geometry.y), (110.0, 90.0));
}

#[test]
fn locked_layer_is_never_moved_by_pointer() {
    let mut editor = Editor::default();
    let id = editor.add_layer(NewLayer::new(LayerKind::Shape));
    editor.toggle_layer_lock(id);
    let mut controller = a4_controller();
    let before = editor.layer(id).unwrap().geometry();

    assert_eq!(
        controller.handle_event(&mut editor, PointerEvent::down(150.0, 120.0)),
        PointerOutcome::SelectionCleared
    );
    controller.handle_event(&mut editor, PointerEvent::moved(10.0, 10.0));
    controller.handle_event(&mut editor, PointerEvent::up(10.0, 10.0));

    assert_eq!(editor.layer(id).unwrap().geometry(), before);
    assert_eq!(editor.selected_id(), None);
    assert_eq!(controller.hover_at(&editor, Point::new(150.0, 120.0)), Some(id));

    // Locking keeps the geometry out of reach of direct updates too.
    let moved = editor.update_layer(id, &LayerPatch::props(PropsPatch::position(0.0, 0.0)));
    assert!(!moved);
    assert_eq!(editor.layer(id).unwrap().geometry(), before);
}

#[test]
fn lost_pointer_up_does_not_leave_a_stuck_drag() {
    let mut editor = Editor::default();
    let id = editor.add_layer(NewLayer::new(LayerKind::Shape));
    let mut controller = a4_controller();

    controller.pointer_down(&mut editor, Point::new(110.0, 110.0));
    controller.pointer_move(&mut editor, Point::new(130.0, 110.0));
    // Pointer left the surface; the next up anywhere ends the gesture.
    controller.handle_event(&mut editor, PointerEvent::up(9999.0, 9999.0));
    assert!(!controller.is_active());
    assert!(!editor.in_gesture());

    assert_eq!(
        controller.pointer_move(&mut editor, Point::new(200.0, 200.0)),
        PointerOutcome::Ignored
    );
    assert_eq!(editor.layer(id).unwrap().geometry().x, 120.0);
}

// ─── Persistence ────────────────────────────────────────────────────────

#[test]
fn autosave_sends_only_the_latest_payload() {
    let backend = Arc::new(MemoryBackend::new());
    let config = EditorConfig::default();
    let (mut session, _) = block_on(DesignSession::create(
        backend.clone(),
        NewDesign::for_template("boda-a4"),
        &config,
    ))
    .unwrap();
    let mut editor = Editor::new(config);
    let start = Instant::now();

    editor.add_layer(text("A"));
    session.autosave(&editor, start);
    editor.add_layer(text("B"));
    session.autosave(&editor, start + Duration::from_millis(1000));

    let mut saved = Vec::new();
    for ms in (0..=5000).step_by(250) {
        if let AutoSaveOutcome::Saved { revision } =
            block_on(session.poll_autosave(start + Duration::from_millis(ms)))
        {
            editor.mark_saved(revision);
            saved.push(ms);
        }
    }

    assert_eq!(saved, vec![3000]);
    assert_eq!(backend.update_calls(), 1);
    assert!(!editor.document().is_dirty());
    let stored = block_on(backend.get_design(session.design_id())).unwrap();
    let texts: Vec<_> = stored
        .design_data
        .layers
        .iter()
        .map(|l| l.props.style.text.clone().unwrap_or_default())
        .collect();
    assert_eq!(texts, vec!["A", "B"]);
}

#[test]
fn reload_continues_id_allocation_past_stored_ids() {
    let backend = Arc::new(MemoryBackend::new());
    let config = EditorConfig::default();
    let (mut session, _) = block_on(DesignSession::create(
        backend.clone(),
        NewDesign::for_template("t"),
        &config,
    ))
    .unwrap();

    let mut editor = Editor::new(config.clone());
    editor.add_layer(text("a"));
    editor.add_layer(text("b"));
    block_on(session.save(&mut editor)).unwrap();

    let mut reopened = Editor::new(config.clone());
    let mut reader = DesignSession::new(backend, session.design_id(), &config);
    block_on(reader.load(&mut reopened)).unwrap();

    assert_eq!(reopened.document().ids(), vec![1, 2]);
    assert!(!reopened.can_undo());
    assert_eq!(reopened.add_layer(text("c")), 3);
}

#[test]
fn foreign_layers_survive_load_and_save() {
    let backend = Arc::new(MemoryBackend::new());
    let config = EditorConfig::default();
    let (mut session, _) = block_on(DesignSession::create(
        backend.clone(),
        NewDesign::for_template("t"),
        &config,
    ))
    .unwrap();

    let stored: Vec<Layer> = serde_json::from_value(serde_json::json!([
        { "id": 1, "name": "Pegatina", "type": "sticker",
          "props": { "x": 10, "y": 10, "width": 40, "height": 40, "rotation": 45 } },
        { "id": 1, "name": "Texto", "type": "text", "props": { "text": "Hola" } }
    ]))
    .unwrap();
    let mut editor = Editor::new(config);
    editor.load(stored, 1.0);
    assert_eq!(editor.document().ids(), vec![1, 2]);

    editor.update_layer(2, &LayerPatch::props(PropsPatch::position(0.0, 0.0)));
    block_on(session.save(&mut editor)).unwrap();

    let saved = block_on(backend.get_design(session.design_id())).unwrap();
    let json = serde_json::to_value(&saved.design_data.layers).unwrap();
    assert_eq!(json[0]["type"], "sticker");
    assert_eq!(json[0]["props"]["rotation"], 45);
    assert_eq!(json[1]["id"], 2);
}
