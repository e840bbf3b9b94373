use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::config::SyncConfig;
use crate::embedded::{Admission, ChannelState, EmbeddedSyncChannel, LinkDecision};
use crate::host::{HostEffect, RecordingHost};
use crate::locator::Locator;
use crate::message::OutboundMessage;
use crate::page::HtmlPage;
use crate::style;
use crate::surface::{DomEvent, EditEvent, ElementKind};
use crate::testing::{field_attr, field_texts, section_attr, RecordingSurface, SurfaceCall};
use crate::tree;

const PAGE_URL: &str = "https://site.example.com/?preview=true";
const EDITOR: &str = "https://editor.example.org";

const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<section data-section-id="hero">
    <h1 data-field="title" data-style-target="title">Old Title</h1>
    <p data-field="subtitle" data-field-empty style="display: none"></p>
    <img data-field="image" src="old.png">
    <a data-field="cta.href" href="/start">Start</a>
</section>
<section data-section-id="gallery">
    <div data-list="gallery">
        <figure data-list-item><img data-field="src" src="placeholder.jpg"></figure>
    </div>
</section>
<section data-section-id="about" style="outline: 1px solid red">
    <p data-field="body">About</p>
</section>
</body></html>"#;

type Channel = EmbeddedSyncChannel<HtmlPage, RecordingHost>;

fn channel() -> Channel {
    channel_at(PAGE_URL)
}

fn channel_at(url: &str) -> Channel {
    EmbeddedSyncChannel::new(
        url,
        SyncConfig::default(),
        HtmlPage::parse(PAGE),
        RecordingHost::new(),
    )
    .unwrap()
}

fn send(channel: &mut Channel, data: Value) -> Admission {
    channel.handle_message(EDITOR, &data)
}

fn edit_key(channel: &Channel, section: &str, field: &str) -> u32 {
    field_attr(channel.surface(), section, field, "data-edit-key")
        .unwrap()
        .parse()
        .unwrap()
}

fn section_outline(channel: &Channel, section: &str) -> Option<String> {
    let page = channel.surface();
    let node = Locator::new(&page.config().vocabulary)
        .section(page.document(), section)
        .unwrap();
    style::get_property(&node, "outline")
}

fn last_post(channel: &Channel) -> (OutboundMessage, String) {
    let posted = channel.host().posted();
    let (message, target) = posted.last().unwrap();
    ((*message).clone(), target.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_activation_binds_and_announces_ready() {
    let channel = channel();
    assert_eq!(channel.state(), ChannelState::Active);
    assert_eq!(channel.host().posted(), vec![(&OutboundMessage::Ready, "*")]);

    let page = channel.surface();
    assert_eq!(field_attr(page, "hero", "title", "contenteditable").as_deref(), Some("true"));
    assert_eq!(field_attr(page, "hero", "image", "contenteditable"), None);
    assert!(field_attr(page, "hero", "image", "data-edit-key").is_some());
}

#[test]
fn test_inactive_without_preview_flag() {
    let mut channel = channel_at("https://site.example.com/");
    assert_eq!(channel.state(), ChannelState::Inactive);

    let admission = send(
        &mut channel,
        json!({"type": "field-update", "sectionId": "hero", "field": "title", "value": "X"}),
    );
    assert_eq!(admission, Admission::Inactive);
    assert_eq!(field_texts(channel.surface(), "hero", "title"), vec!["Old Title"]);
    assert!(channel.host().effects().is_empty());
    assert_eq!(field_attr(channel.surface(), "hero", "title", "contenteditable"), None);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD AND FULL UPDATES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_field_update_reveals_placeholder() {
    let mut channel = channel();
    let admission = send(
        &mut channel,
        json!({"type": "field-update", "sectionId": "hero", "field": "subtitle", "value": "Hello"}),
    );
    assert_eq!(admission, Admission::Applied);

    let page = channel.surface();
    assert_eq!(field_texts(page, "hero", "subtitle"), vec!["Hello"]);
    assert_eq!(field_attr(page, "hero", "subtitle", "data-field-empty"), None);
    assert_eq!(field_attr(page, "hero", "subtitle", "style"), None);
}

#[test]
fn test_null_value_leaves_field_unchanged() {
    let mut channel = channel();
    send(
        &mut channel,
        json!({"type": "field-update", "sectionId": "hero", "field": "subtitle", "value": null}),
    );
    send(
        &mut channel,
        json!({"type": "field-update", "sectionId": "hero", "field": "subtitle"}),
    );

    let page = channel.surface();
    assert_eq!(field_texts(page, "hero", "subtitle"), vec![""]);
    assert_eq!(field_attr(page, "hero", "subtitle", "style").as_deref(), Some("display: none"));
    assert!(field_attr(page, "hero", "subtitle", "data-field-empty").is_some());
}

#[test]
fn test_full_update_sets_title_and_shows_section() {
    let mut channel = channel();
    send(&mut channel, json!({"type": "section-toggle", "sectionId": "hero", "enabled": false}));

    send(
        &mut channel,
        json!({
            "type": "full-update",
            "data": {"hero": {"title": "New Title"}},
            "sections": {"hero": {"enabled": true}}
        }),
    );

    let page = channel.surface();
    assert_eq!(field_texts(page, "hero", "title"), vec!["New Title"]);
    assert_eq!(section_attr(page, "hero", "style"), None);
}

#[test]
fn test_full_update_style_key_goes_to_style_target() {
    let mut channel = channel();
    send(
        &mut channel,
        json!({
            "type": "full-update",
            "data": {"hero": {"title__style": {"textAlign": "center", "position": "absolute"}}},
            "sections": {}
        }),
    );

    let page = channel.surface();
    assert_eq!(field_attr(page, "hero", "title", "style").as_deref(), Some("text-align: center"));
    assert_eq!(field_texts(page, "hero", "title"), vec!["Old Title"]);
}

#[test]
fn test_full_update_order_on_surface() {
    let surface = RecordingSurface::default();
    let mut channel =
        EmbeddedSyncChannel::new(PAGE_URL, SyncConfig::default(), surface, RecordingHost::new())
            .unwrap();
    channel.handle_message(
        EDITOR,
        &json!({
            "type": "full-update",
            "data": {"hero": {"title": "T"}, "theme": {"colors": {"primary": "#000"}}},
            "sections": {"hero": {}, "footer": {"enabled": false}}
        }),
    );

    let calls = &channel.surface().calls;
    assert_eq!(calls.first(), Some(&SurfaceCall::Bind));
    assert_eq!(calls.last(), Some(&SurfaceCall::Bind));
    assert_eq!(
        calls[1..3].to_vec(),
        vec![
            SurfaceCall::Enabled {
                section: "footer".into(),
                enabled: false
            },
            SurfaceCall::Enabled {
                section: "hero".into(),
                enabled: true
            },
        ]
    );
    assert!(calls.iter().any(|c| matches!(c, SurfaceCall::Theme(t) if t.colors.primary.as_deref() == Some("#000"))));
    assert!(calls.contains(&SurfaceCall::Field {
        section: "hero".into(),
        field: "title".into(),
        value: json!("T"),
    }));
}

#[test]
fn test_last_applied_wins() {
    let mut channel = channel();
    send(
        &mut channel,
        json!({"type": "full-update", "data": {"hero": {"title": "A"}}, "sections": {}}),
    );
    send(
        &mut channel,
        json!({"type": "field-update", "sectionId": "hero", "field": "title", "value": "B"}),
    );
    assert_eq!(field_texts(channel.surface(), "hero", "title"), vec!["B"]);
}

#[test]
fn test_gallery_list_update() {
    let mut channel = channel();
    send(
        &mut channel,
        json!({
            "type": "field-update",
            "sectionId": "gallery",
            "field": "gallery",
            "value": [{"src": "a.jpg"}, {"src": "b.jpg"}]
        }),
    );

    let page = channel.surface();
    let section = Locator::new(&page.config().vocabulary)
        .section(page.document(), "gallery")
        .unwrap();
    let items = tree::find_all_by_attr(&section, "data-list-item", None);
    assert_eq!(items.len(), 2);

    let sources: Vec<_> = tree::find_all_by_attr(&section, "data-field", Some("src"))
        .iter()
        .filter_map(|n| tree::get_attr(n, "src"))
        .collect();
    assert_eq!(sources, vec!["a.jpg", "b.jpg"]);
    assert!(tree::find_all_by_attr(&section, "data-edit-key", None).is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// VISIBILITY, HIGHLIGHT, SCROLL
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_section_toggle_round_trip() {
    let mut channel = channel();
    send(&mut channel, json!({"type": "section-toggle", "sectionId": "hero", "enabled": false}));
    assert_eq!(section_attr(channel.surface(), "hero", "style").as_deref(), Some("display: none"));

    send(&mut channel, json!({"type": "section-toggle", "sectionId": "hero", "enabled": true}));
    assert_eq!(section_attr(channel.surface(), "hero", "style"), None);
}

#[test]
fn test_highlight_moves_and_restores_outline() {
    let mut channel = channel();
    let outline = SyncConfig::default().affordances.highlight_outline;

    send(&mut channel, json!({"type": "section-highlight", "sectionId": "about"}));
    assert_eq!(section_outline(&channel, "about").as_deref(), Some(outline.as_str()));

    send(&mut channel, json!({"type": "section-highlight", "sectionId": "hero"}));
    assert_eq!(section_outline(&channel, "about").as_deref(), Some("1px solid red"));
    assert_eq!(section_outline(&channel, "hero").as_deref(), Some(outline.as_str()));

    send(&mut channel, json!({"type": "section-highlight", "sectionId": null}));
    assert_eq!(section_outline(&channel, "hero"), None);
}

#[test]
fn test_scroll_to_rendered_section_only() {
    let mut channel = channel();
    send(&mut channel, json!({"type": "scroll-to-section", "sectionId": "about"}));
    send(&mut channel, json!({"type": "scroll-to-section", "sectionId": "missing"}));

    let scrolls: Vec<_> = channel
        .host()
        .effects()
        .iter()
        .filter(|e| matches!(e, HostEffect::ScrollIntoView { .. }))
        .collect();
    assert_eq!(
        scrolls,
        vec![&HostEffect::ScrollIntoView {
            section_id: "about".into(),
            smooth: true
        }]
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADMISSION AND PARENT ORIGIN
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_untrusted_origin_dropped_and_unlatched() {
    let mut channel = channel();
    let admission = channel.handle_message(
        "http://evil.example.net",
        &json!({"type": "field-update", "sectionId": "hero", "field": "title", "value": "Pwned"}),
    );

    assert_eq!(admission, Admission::Rejected);
    assert_eq!(channel.parent_origin(), None);
    assert_eq!(field_texts(channel.surface(), "hero", "title"), vec!["Old Title"]);
}

#[test]
fn test_rejected_messages_never_reach_surface() {
    let mut channel = EmbeddedSyncChannel::new(
        PAGE_URL,
        SyncConfig::default(),
        RecordingSurface::default(),
        RecordingHost::new(),
    )
    .unwrap();
    channel.handle_message("http://evil.example.net", &json!({"type": "section-highlight", "sectionId": "hero"}));
    assert!(channel.surface().mutations().is_empty());
}

#[test]
fn test_outbound_goes_to_latched_origin() {
    let mut channel = channel();
    send(&mut channel, json!({"type": "section-highlight", "sectionId": null}));
    assert_eq!(channel.parent_origin(), Some(EDITOR));

    // A later admissible origin neither relatches nor receives events
    channel.handle_message("http://localhost:3000", &json!({"type": "section-highlight", "sectionId": null}));
    assert_eq!(channel.parent_origin(), Some(EDITOR));

    let key = edit_key(&channel, "hero", "title");
    channel.handle_dom_event(&DomEvent::Focus { key });
    assert_eq!(
        last_post(&channel),
        (
            OutboundMessage::ElementSelected {
                section_id: "hero".into(),
                field: "title".into(),
                element_type: ElementKind::Text,
                content: "Old Title".into(),
            },
            EDITOR.to_string()
        )
    );

    channel.handle_dom_event(&DomEvent::Input {
        key,
        text: "Typed".into(),
    });
    assert_eq!(
        last_post(&channel),
        (
            OutboundMessage::FieldEdited {
                section_id: "hero".into(),
                field: "title".into(),
                value: "Typed".into(),
            },
            EDITOR.to_string()
        )
    );
}

#[test]
fn test_image_click_selects_then_requests_replace() {
    let mut channel = channel();
    send(&mut channel, json!({"type": "section-highlight", "sectionId": null}));
    let key = edit_key(&channel, "hero", "image");
    let before = channel.host().posted().len();

    channel.handle_dom_event(&DomEvent::ImageClick { key });

    let posted = channel.host().posted();
    let messages: Vec<_> = posted[before..].iter().map(|(m, _)| (*m).clone()).collect();
    assert_eq!(
        messages,
        vec![
            OutboundMessage::ElementSelected {
                section_id: "hero".into(),
                field: "image".into(),
                element_type: ElementKind::Image,
                content: "old.png".into(),
            },
            OutboundMessage::ImageReplaceRequested {
                section_id: "hero".into(),
                field: "image".into(),
            },
        ]
    );
}

#[test]
fn test_edit_events_forwarded_from_surface() {
    let mut surface = RecordingSurface::default();
    surface.edit_events = vec![EditEvent::AiSuggestRequested {
        section_id: "hero".into(),
        field: "title".into(),
        content: "Old".into(),
    }];
    let mut channel =
        EmbeddedSyncChannel::new(PAGE_URL, SyncConfig::default(), surface, RecordingHost::new())
            .unwrap();

    channel.handle_dom_event(&DomEvent::AiSuggest { key: 1 });
    assert_eq!(
        last_post_generic(channel.host()),
        OutboundMessage::AiSuggestRequested {
            section_id: "hero".into(),
            field: "title".into(),
            content: "Old".into(),
        }
    );
}

fn last_post_generic(host: &RecordingHost) -> OutboundMessage {
    host.posted().last().map(|(m, _)| (*m).clone()).unwrap()
}

#[test]
fn test_click_outside_field_deselects() {
    let mut channel = channel();
    channel.handle_dom_event(&DomEvent::Click { on_field: true });
    assert_eq!(channel.host().posted().len(), 1);

    channel.handle_dom_event(&DomEvent::Click { on_field: false });
    assert_eq!(last_post(&channel).0, OutboundMessage::Deselect);
}

#[test]
fn test_unknown_and_malformed_messages_ignored() {
    let mut channel = channel();
    let before = channel.surface().to_html();

    assert_eq!(send(&mut channel, json!({"type": "telemetry"})), Admission::Ignored);
    assert_eq!(send(&mut channel, json!("just a string")), Admission::Ignored);
    assert_eq!(send(&mut channel, json!({"type": "section-toggle"})), Admission::Ignored);
    assert_eq!(channel.surface().to_html(), before);
}

// ═══════════════════════════════════════════════════════════════════════════════
// LINK INTERCEPTION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_same_origin_links_keep_preview_flag() {
    let mut channel = channel();
    assert_eq!(
        channel.intercept_link("/team"),
        LinkDecision::Navigate("https://site.example.com/team?preview=true".into())
    );
    assert_eq!(
        channel.intercept_link("about?tab=2"),
        LinkDecision::Navigate("https://site.example.com/about?tab=2&preview=true".into())
    );

    channel.handle_dom_event(&DomEvent::LinkClick {
        href: "/contact".into(),
    });
    assert_eq!(
        channel.host().effects().last(),
        Some(&HostEffect::Navigate {
            url: "https://site.example.com/contact?preview=true".into()
        })
    );
}

#[test]
fn test_links_passed_through() {
    let mut channel = channel();
    for href in ["#pricing", "", "https://other.example.net/x", "/team?preview=true"] {
        assert_eq!(channel.intercept_link(href), LinkDecision::PassThrough, "{}", href);
    }
    assert!(!channel
        .host()
        .effects()
        .iter()
        .any(|e| matches!(e, HostEffect::Navigate { .. })));
}
