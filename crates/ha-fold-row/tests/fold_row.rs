//! Behavior of the fold row against the in-process host

use std::sync::Arc;
use std::time::Duration;

use ha_config::ConfigError;
use ha_core::{Hass, HassEntity, ATTR_ENTITY_ID};
use ha_fold_row::memory::MemoryHost;
use ha_fold_row::{
    same_element, FoldEntityRow, FoldEvent, FoldPhase, FoldRowError, HeadBinding, Height,
    Overflow, ParentCard, Placement, TOGGLE_LABEL,
};
use serde_json::{json, Map, Value};
use tokio_test::{assert_pending, assert_ready_ok, task};

fn fold_row(config: Value) -> (MemoryHost, FoldEntityRow) {
    let host = MemoryHost::new();
    let row = FoldEntityRow::new(host.fold_host());
    row.set_config(&config).unwrap();
    (host, row)
}

fn group_hass(group: &str, members: Value) -> Arc<Hass> {
    let mut attributes = Map::new();
    attributes.insert(ATTR_ENTITY_ID.to_string(), members);
    Arc::new(Hass::from_states([HassEntity::new(group, "on", attributes)]))
}

fn entities(rows: &[ha_fold_row::RowHandle]) -> Vec<String> {
    rows.iter()
        .map(|row| row.config().entity().unwrap_or_default().to_string())
        .collect()
}

fn config_error(err: &FoldRowError) -> &ConfigError {
    err.config_error().expect("configuration error")
}

// ==================== Configuration errors ====================

#[test]
fn test_missing_head() {
    let host = MemoryHost::new();
    let row = FoldEntityRow::new(host.fold_host());

    let err = row
        .set_config(&json!({"entities": ["light.a"], "open": true}))
        .unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::MissingHead));
    assert!(row.config().is_none());
    assert!(row.render().is_none());
}

#[tokio::test]
async fn test_missing_items() {
    let (_host, row) = fold_row(json!({"head": {"type": "section"}, "open": true}));

    let err = row.load_rows().await.unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::MissingItems));
    assert!(row.rows().is_none());
}

#[tokio::test]
async fn test_items_must_be_a_list() {
    let (_host, row) = fold_row(json!({"head": {"type": "section"}, "items": "light.a"}));
    let err = row.load_rows().await.unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::InvalidItems));

    let (_host, row) = fold_row(json!({"entity": "sensor.x", "entities": {"light.a": {}}}));
    let err = row.load_rows().await.unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::InvalidItems));
}

#[tokio::test]
async fn test_failed_load_stays_failed_until_reconfigured() {
    let host = MemoryHost::new();
    let row = FoldEntityRow::new(host.fold_host());
    row.set_config(&json!({"head": {"type": "section"}})).unwrap();

    assert!(row.load_rows().await.is_err());
    assert!(row.toggle().await.is_err());
    assert!(!row.is_open());
    assert_eq!(row.phase(), FoldPhase::Closed);
    assert!(!row.toggle_state().show_content);
    assert_eq!(host.overflow(), Overflow::Hidden);
    assert!(row.render().unwrap().rows.is_empty());

    row.set_config(&json!({"head": {"type": "section"}, "entities": ["light.a"]}))
        .unwrap();
    assert_eq!(row.load_rows().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_toggle_requires_config() {
    let host = MemoryHost::new();
    let row = FoldEntityRow::new(host.fold_host());
    assert!(matches!(row.toggle().await, Err(FoldRowError::NotConfigured)));
}

// ==================== Row creation ====================

#[tokio::test]
async fn test_entities_win_over_items() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.a"],
        "items": ["light.b"]
    }));

    let rows = row.load_rows().await.unwrap();
    assert_eq!(entities(&rows), vec!["light.a"]);
    assert!(host.created("light.b").is_empty());
}

#[tokio::test]
async fn test_load_rows_is_idempotent() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.a", {"entity": "light.b", "name": "Bed"}]
    }));
    row.head().await.unwrap();
    assert_eq!(host.create_calls(), 1);

    let first = row.load_rows().await.unwrap();
    let second = row.load_rows().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(host.create_calls(), 3);
    assert_eq!(first[1].config().get("name"), Some(&json!("Bed")));
}

#[tokio::test]
async fn test_concurrent_loads_share_one_batch() {
    let (host, row) = fold_row(json!({"head": {"type": "section"}, "entities": ["light.a"]}));
    host.set_delay("light.a", Duration::from_millis(5));

    let (first, second) = tokio::join!(row.load_rows(), row.load_rows());
    assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    assert_eq!(host.created("light.a").len(), 1);
}

#[tokio::test]
async fn test_row_order_survives_out_of_order_completion() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.x", "light.y", "light.z"]
    }));
    host.set_delay("light.z", Duration::from_millis(1));
    host.set_delay("light.x", Duration::from_millis(15));
    host.set_delay("light.y", Duration::from_millis(30));

    let rows = row.load_rows().await.unwrap();

    assert_eq!(entities(&rows), vec!["light.x", "light.y", "light.z"]);
    let completed: Vec<String> = host
        .completion_order()
        .into_iter()
        .filter(|entity| !entity.is_empty())
        .collect();
    assert_eq!(completed, vec!["light.z", "light.x", "light.y"]);
}

#[tokio::test]
async fn test_group_config_applies_to_children_only() {
    let (host, row) = fold_row(json!({
        "entity": "sensor.head",
        "entities": ["light.a", {"entity": "light.b", "secondary_info": "none"}],
        "group_config": {"secondary_info": "last-changed"}
    }));

    let head = row.head().await.unwrap();
    let rows = row.load_rows().await.unwrap();

    assert_eq!(head.config().get("secondary_info"), None);
    assert_eq!(rows[0].config().get("secondary_info"), Some(&json!("last-changed")));
    assert_eq!(rows[1].config().get("secondary_info"), Some(&json!("none")));
    assert_eq!(host.style_requests().len(), 3);
}

#[tokio::test]
async fn test_state_color_from_parent_card() {
    let host = MemoryHost::new();
    host.set_parent(Some(ParentCard {
        config: json!({"show_state_color": true}).as_object().cloned().unwrap(),
    }));
    let row = FoldEntityRow::new(host.fold_host());
    row.set_config(&json!({"entity": "light.head", "entities": ["light.a"]}))
        .unwrap();

    let rows = row.load_rows().await.unwrap();
    assert_eq!(rows[0].config().get("state_color"), Some(&json!(true)));

    row.set_config(&json!({
        "entity": "light.head",
        "entities": ["light.a"],
        "state_color": false
    }))
    .unwrap();
    let rows = row.load_rows().await.unwrap();
    assert_eq!(rows[0].config().get("state_color"), Some(&json!(false)));
}

#[tokio::test]
async fn test_set_config_starts_a_new_lifetime() {
    let (host, row) = fold_row(json!({"head": {"type": "section"}, "entities": ["light.a"]}));
    let old_head = row.head().await.unwrap();
    let old_rows = row.load_rows().await.unwrap();

    row.set_config(&json!({"head": {"type": "section"}, "entities": ["light.a"]}))
        .unwrap();
    assert!(row.rows().is_none());

    let new_head = row.head().await.unwrap();
    let new_rows = row.load_rows().await.unwrap();
    assert!(!same_element(&old_head, &new_head));
    assert!(!same_element(&old_rows[0], &new_rows[0]));
    assert_eq!(host.created("light.a").len(), 2);
}

#[tokio::test]
async fn test_initially_open_loads_rows() {
    let (_host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.a", "light.b"],
        "open": true
    }));

    assert!(row.is_open());
    assert_eq!(row.phase(), FoldPhase::Open);
    row.load_rows().await.unwrap();

    let view = row.render().unwrap();
    assert_eq!(view.rows.len(), 2);
    assert!(view.container.aria_expanded);
    assert_eq!(view.container.overflow, Overflow::Initial);
}

#[tokio::test]
async fn test_initially_open_starts_loading_on_configure() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.a", "light.b", "light.c"],
        "open": true
    }));

    // Only give the background loads a chance to run
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    assert_eq!(host.create_calls(), 4);
    let rows = row.rows().expect("rows created without being asked for");
    assert_eq!(entities(&rows), vec!["light.a", "light.b", "light.c"]);
    assert_eq!(row.render().unwrap().rows.len(), 3);
}

#[tokio::test]
async fn test_empty_entities_is_a_valid_source() {
    let hass = group_hass("group.x", json!(["light.a"]));
    let (host, row) = fold_row(json!({"entity": "group.x", "entities": []}));
    row.set_hass(hass).await;

    let rows = row.load_rows().await.unwrap();
    assert!(rows.is_empty());
    assert!(host.created("light.a").is_empty());
}

// ==================== Toggle ====================

#[tokio::test]
async fn test_toggle_round_trip() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section", "label": "Lights"},
        "entities": ["light.a", "light.b"]
    }));
    host.set_content_height(96.0);
    let head = row.head().await.unwrap();
    assert_eq!(head.attribute("aria-checked").as_deref(), Some("false"));

    row.toggle().await.unwrap();
    assert!(row.is_open());
    assert_eq!(row.phase(), FoldPhase::Opening);
    assert_eq!(host.height(), Height::Px(96.0));
    assert_eq!(host.overflow(), Overflow::Hidden);
    assert!(row.toggle_state().show_content);
    assert_eq!(head.attribute("aria-checked").as_deref(), Some("true"));

    assert!(row.handle_event(FoldEvent::TransitionEnd).await.unwrap());
    assert_eq!(row.phase(), FoldPhase::Open);
    assert_eq!(host.height(), Height::Unset);
    assert_eq!(host.overflow(), Overflow::Initial);

    row.toggle().await.unwrap();
    assert!(!row.is_open());
    assert_eq!(row.phase(), FoldPhase::Closing);
    assert_eq!(host.height(), Height::Px(0.0));
    assert_eq!(head.attribute("aria-checked").as_deref(), Some("false"));
    assert!(row.toggle_state().show_content);

    row.transition_end();
    assert_eq!(row.phase(), FoldPhase::Closed);
    assert!(!row.toggle_state().show_content);
    assert_eq!(host.overflow(), Overflow::Hidden);
    assert!(row.render().unwrap().rows.is_empty());

    // Rows were created once for both opens
    row.toggle().await.unwrap();
    assert_eq!(host.created("light.a").len(), 1);
}

#[tokio::test]
async fn test_double_toggle_while_loading_shares_one_load() {
    let (host, row) = fold_row(json!({"head": {"type": "section"}, "entities": ["light.a"]}));
    host.set_delay("light.a", Duration::from_millis(20));
    host.set_content_height(40.0);

    let (first, second) = tokio::join!(row.toggle(), row.toggle());
    first.unwrap();
    second.unwrap();

    assert_eq!(host.created("light.a").len(), 1);
    assert!(row.is_open());
    assert!(row.toggle_state().show_content);

    row.transition_end();
    assert_eq!(row.phase(), FoldPhase::Open);
    assert_eq!(row.render().unwrap().rows.len(), 1);
}

#[tokio::test]
async fn test_toggle_without_content_uses_auto_height() {
    let (host, row) = fold_row(json!({"head": {"type": "section"}, "entities": []}));

    row.toggle().await.unwrap();
    assert_eq!(host.height(), Height::Auto);
    assert_eq!(row.phase(), FoldPhase::Open);
}

// ==================== Head ====================

#[tokio::test]
async fn test_interactive_head_is_left_alone() {
    let (host, row) = fold_row(json!({"entity": "light.x", "entities": ["light.a"]}));
    let head = row.head().await.unwrap();

    assert_eq!(row.head_binding(), None);
    assert_eq!(head.attribute("role"), None);
    assert!(host.queries().is_empty());

    let view = row.render().unwrap();
    let toggle = view.toggle.unwrap();
    assert_eq!(toggle.role, "switch");
    assert!(!toggle.aria_checked);

    // Action events only count when the head is bound
    assert!(!row.handle_event(FoldEvent::Action).await.unwrap());
    assert!(!row.is_open());
}

#[tokio::test]
async fn test_plain_head_binds_action_handler() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section", "label": "Y"},
        "entities": ["light.a"]
    }));
    let head = row.head().await.unwrap();

    assert_eq!(row.head_binding(), Some(HeadBinding::ActionHandler));
    assert_eq!(host.action_bindings(), 1);
    assert_eq!(host.queries(), vec![ha_fold_row::HEAD_ACTION_TARGET.to_string()]);
    assert_eq!(head.attribute("role").as_deref(), Some("switch"));
    assert_eq!(head.attribute("tabindex").as_deref(), Some("0"));
    assert_eq!(head.attribute("aria-label").as_deref(), Some(TOGGLE_LABEL));
    assert_eq!(head.attribute("aria-checked").as_deref(), Some("false"));
    assert!(row.render().unwrap().toggle.is_none());

    assert!(row.handle_event(FoldEvent::Action).await.unwrap());
    assert!(row.is_open());
    assert_eq!(head.attribute("aria-label").as_deref(), Some(TOGGLE_LABEL));
    assert_eq!(head.attribute("aria-checked").as_deref(), Some("true"));
}

#[tokio::test]
async fn test_nested_head_target_delegates_tap_action() {
    let host = MemoryHost::new();
    host.set_nested_action_target(true);
    let row = FoldEntityRow::new(host.fold_host());
    row.set_config(&json!({
        "head": {"entity": "light.x"},
        "clickable": true,
        "entities": ["light.a"]
    }))
    .unwrap();
    row.head().await.unwrap();

    assert_eq!(row.head_binding(), Some(HeadBinding::Delegated));
    assert_eq!(host.action_bindings(), 0);
    let created = host.created("light.x");
    assert_eq!(
        created[0].tap_action(),
        Some(json!({"action": "fire-dom-event", "fold_row": true}))
    );

    assert!(!row.handle_event(FoldEvent::Action).await.unwrap());
    assert!(!row
        .handle_event(FoldEvent::LlCustom(json!({"action": "more-info"})))
        .await
        .unwrap());
    assert!(row
        .handle_event(FoldEvent::LlCustom(json!({"fold_row": true})))
        .await
        .unwrap());
    assert!(row.is_open());
}

// ==================== hass propagation ====================

#[tokio::test]
async fn test_hass_reaches_every_created_row_once() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.a", "light.b"]
    }));
    row.head().await.unwrap();
    row.load_rows().await.unwrap();
    let calls = host.create_calls();

    let first = Arc::new(Hass::new());
    row.set_hass(first.clone()).await;
    for created in host.all_created() {
        assert_eq!(created.hass_updates(), 1);
        assert!(Arc::ptr_eq(&created.hass().unwrap(), &first));
    }

    row.set_hass(Arc::new(Hass::new())).await;
    assert!(host.all_created().iter().all(|r| r.hass_updates() == 2));
    assert_eq!(host.create_calls(), calls);
}

#[tokio::test]
async fn test_rows_created_after_hass_get_it_at_creation() {
    let (host, row) = fold_row(json!({"head": {"type": "section"}, "entities": ["light.a"]}));
    let hass = Arc::new(Hass::new());
    row.set_hass(hass.clone()).await;

    row.load_rows().await.unwrap();
    let created = host.created("light.a");
    assert_eq!(created[0].hass_updates(), 1);
    assert!(Arc::ptr_eq(&created[0].hass().unwrap(), &hass));
}

#[tokio::test]
async fn test_hass_arriving_mid_batch_reaches_finished_rows() {
    let (host, row) = fold_row(json!({
        "head": {"type": "section"},
        "entities": ["light.a", "light.b"]
    }));
    host.set_delay("light.b", Duration::from_millis(30));
    let hass = Arc::new(Hass::new());

    let (rows, _) = tokio::join!(row.load_rows(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        row.set_hass(hass.clone()).await;
    });
    rows.unwrap();

    for entity in ["light.a", "light.b"] {
        let created = host.created(entity);
        assert_eq!(created[0].hass_updates(), 1, "{}", entity);
        assert!(Arc::ptr_eq(&created[0].hass().unwrap(), &hass));
    }
}

#[tokio::test]
async fn test_group_rows_wait_for_hass() {
    let (host, row) = fold_row(json!({"entity": "group.x"}));
    row.head().await.unwrap();

    let mut load = task::spawn(row.load_rows());
    assert_pending!(load.poll());
    assert_pending!(load.poll());
    assert_eq!(host.create_calls(), 1);

    let hass = group_hass("group.x", json!(["light.a", "light.b"]));
    row.set_hass(hass.clone()).await;

    assert!(load.is_woken());
    let rows = assert_ready_ok!(load.poll());
    drop(load);

    assert_eq!(entities(&rows), vec!["light.a", "light.b"]);
    assert!(host
        .created("light.a")
        .iter()
        .all(|r| r.hass().map(|h| Arc::ptr_eq(&h, &hass)) == Some(true)));
}

#[tokio::test]
async fn test_group_without_members() {
    let (_host, row) = fold_row(json!({"entity": "group.x"}));
    row.set_hass(Arc::new(Hass::new())).await;

    let err = row.load_rows().await.unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::MissingItems));
}

// ==================== Placement ====================

#[tokio::test]
async fn test_placement_advisory_once_per_mount() {
    let (host, row) = fold_row(json!({"entity": "light.x", "entities": []}));
    assert_eq!(row.connected().await, Placement::InCard);

    host.set_parent(None);
    assert_eq!(row.connected().await, Placement::Detached { warned: true });
    assert_eq!(row.connected().await, Placement::Detached { warned: false });

    row.disconnected();
    assert_eq!(row.connected().await, Placement::Detached { warned: true });
}

#[tokio::test]
async fn test_placement_advisory_muted() {
    let (host, row) = fold_row(json!({"entity": "light.x", "entities": [], "mute": true}));
    host.set_parent(None);
    assert_eq!(row.connected().await, Placement::Detached { warned: false });
}

// ==================== Rendering ====================

#[tokio::test]
async fn test_render_mounts_cached_rows() {
    let (host, row) = fold_row(json!({
        "entity": "light.x",
        "entities": ["light.a", "light.b"],
        "padding": 8
    }));
    host.set_content_height(80.0);

    let closed = row.render().unwrap();
    assert!(closed.rows.is_empty());
    assert!(closed.container.aria_hidden);
    assert_eq!(closed.container.padding_px, 8.0);

    row.toggle().await.unwrap();
    let open = row.render().unwrap();
    let rows = row.rows().unwrap();
    assert_eq!(open.rows.len(), 2);
    assert!(same_element(&open.rows[0], &rows[0]));
    assert!(open.container.aria_expanded);
    assert_eq!(open.container.height, Height::Px(80.0));
    let toggle = open.toggle.unwrap();
    assert!(toggle.aria_checked && toggle.flipped);
    assert!(same_element(&open.head.unwrap(), &row.head().await.unwrap()));
}
