use engine::{EngineError, MessageOrigin, Provisioned};

mod common;
use common::setup;

const COMMUNITY: engine::CommunityId = 1;
const CHANNEL: engine::ChannelId = 2;

const ORIGIN: MessageOrigin = MessageOrigin::Community {
    community_id: COMMUNITY,
    channel_id: CHANNEL,
};

#[tokio::test]
async fn first_contact_provisions_with_starting_money() {
    let (engine, chat) = setup().await;

    let first = engine.find_or_create_user(10).await.unwrap();
    assert!(matches!(first, Provisioned::Created(_)));
    assert_eq!(first.user().money, 100);

    let second = engine.find_or_create_user(10).await.unwrap();
    assert!(matches!(second, Provisioned::Found(_)));

    // Exactly one welcome notice despite two lookups.
    assert_eq!(chat.directs_to(10).len(), 1);
    assert!(chat.directs_to(10)[0].contains("Welcome"));
}

#[tokio::test]
async fn create_posts_announcement_and_prefills_accept_marker() {
    let (engine, chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();

    assert_eq!(wager.amount, 30);
    let message_id = wager.message_id.unwrap();
    assert_eq!(chat.posts.lock().unwrap().len(), 1);
    assert!(chat.posts.lock().unwrap()[0].1.contains(":wagerin:"));
    assert!(
        chat.added_markers
            .lock()
            .unwrap()
            .contains(&(message_id, engine::MarkerKind::Accept))
    );

    assert_eq!(engine.ledger().outstanding(10).await.unwrap(), 30);
}

#[tokio::test]
async fn create_at_exact_available_balance_is_allowed() {
    let (engine, _chat) = setup().await;

    engine
        .create_wager(ORIGIN, 10, 100, "all in")
        .await
        .unwrap();

    let summary = engine.ledger().summary(10).await.unwrap();
    assert_eq!(summary.money, 100);
    assert_eq!(summary.outstanding, 100);
    assert_eq!(summary.available(), 0);
}

#[tokio::test]
async fn create_beyond_available_is_rejected_without_a_row() {
    let (engine, chat) = setup().await;

    engine
        .create_wager(ORIGIN, 10, 80, "first commitment")
        .await
        .unwrap();

    let err = engine
        .create_wager(ORIGIN, 10, 21, "one over the line")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    // Only the first wager exists and the refusal was explained by notice.
    assert_eq!(engine.wagers().created_by(10).await.unwrap().len(), 1);
    assert!(
        chat.directs_to(10)
            .iter()
            .any(|text| text.contains("don't got the dough"))
    );
}

#[tokio::test]
async fn create_rejects_non_positive_amounts() {
    let (engine, chat) = setup().await;

    let err = engine
        .create_wager(ORIGIN, 10, 0, "nothing at stake")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert!(
        chat.directs_to(10)
            .iter()
            .any(|text| text.contains("real bet"))
    );
    assert!(engine.wagers().created_by(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_rejects_direct_message_context() {
    let (engine, chat) = setup().await;

    let err = engine
        .create_wager(MessageOrigin::Direct, 10, 30, "psst")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedContext(_)));
    assert!(
        chat.directs_to(10)
            .iter()
            .any(|text| text.contains("direct message"))
    );
}

#[tokio::test]
async fn failed_announcement_leaves_no_commitment() {
    let (engine, chat) = setup().await;
    chat.fail_posts();

    let err = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Chat(_)));

    // The row was rolled back, so nothing is held outstanding.
    assert!(engine.wagers().created_by(10).await.unwrap().is_empty());
    assert_eq!(engine.ledger().outstanding(10).await.unwrap(), 0);
}

#[tokio::test]
async fn cancel_commits_even_when_notices_fail() {
    let (engine, chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();

    chat.fail_edits();
    chat.fail_directs();
    engine.cancel_wager(wager.id, 10).await.unwrap();

    assert!(engine.wagers().get(wager.id).await.unwrap().is_none());
    assert_eq!(engine.ledger().outstanding(10).await.unwrap(), 0);
}

#[tokio::test]
async fn cancel_is_creator_only() {
    let (engine, chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();

    let err = engine.cancel_wager(wager.id, 20).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    assert!(
        chat.directs_to(20)
            .iter()
            .any(|text| text.contains("No outstanding wager"))
    );
    assert!(engine.wagers().get(wager.id).await.unwrap().is_some());
}

#[tokio::test]
async fn cancel_strikes_announcement_and_releases_outstanding() {
    let (engine, chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();
    assert_eq!(engine.ledger().outstanding(10).await.unwrap(), 30);

    engine.cancel_wager(wager.id, 10).await.unwrap();

    assert!(engine.wagers().get(wager.id).await.unwrap().is_none());
    assert_eq!(engine.ledger().outstanding(10).await.unwrap(), 0);

    let (message_id, text) = chat.last_edit().unwrap();
    assert_eq!(Some(message_id), wager.message_id);
    assert!(text.starts_with("~~"));
    assert!(
        chat.directs_to(10)
            .iter()
            .any(|text| text.contains("Canceled bet"))
    );
}

#[tokio::test]
async fn cancel_without_ids_lists_cancellable_wagers() {
    let (engine, chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();

    engine.cancel_wagers(10, &[]).await.unwrap();

    let listing = chat
        .directs_to(10)
        .into_iter()
        .find(|text| text.contains("Outstanding Wagers"))
        .unwrap();
    assert!(listing.contains(&format!("**ID:** {}", wager.id)));
    // Nothing was canceled by the listing itself.
    assert!(engine.wagers().get(wager.id).await.unwrap().is_some());
}

#[tokio::test]
async fn member_departure_cancels_open_wagers_without_transfers() {
    let (engine, chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();
    engine
        .on_marker_added(engine::MarkerKind::Accept, wager.message_id.unwrap(), 20)
        .await
        .unwrap();

    engine.handle_member_removed(COMMUNITY, 10).await.unwrap();

    assert!(engine.wagers().get(wager.id).await.unwrap().is_none());
    assert_eq!(engine.ledger().get(10).await.unwrap().money, 100);
    assert_eq!(engine.ledger().get(20).await.unwrap().money, 100);

    // The counterparty was told, and the announcement was struck through.
    assert!(
        chat.directs_to(20)
            .iter()
            .any(|text| text.contains("left the community"))
    );
    let (_, text) = chat.last_edit().unwrap();
    assert!(text.starts_with("~~"));
}

#[tokio::test]
async fn member_departure_in_another_community_changes_nothing() {
    let (engine, _chat) = setup().await;

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();

    engine.handle_member_removed(COMMUNITY + 1, 10).await.unwrap();

    assert!(engine.wagers().get(wager.id).await.unwrap().is_some());
}

#[tokio::test]
async fn wager_list_shows_both_sides() {
    let (engine, chat) = setup().await;
    chat.set_name(10, "Alice");
    chat.set_name(20, "Bob");

    let wager = engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();
    engine
        .on_marker_added(engine::MarkerKind::Accept, wager.message_id.unwrap(), 20)
        .await
        .unwrap();

    engine.send_wager_list(10).await.unwrap();
    let created = chat
        .directs_to(10)
        .into_iter()
        .find(|text| text.contains("Your created wagers"))
        .unwrap();
    assert!(created.contains("**Accepted by:** Bob"));

    engine.send_wager_list(20).await.unwrap();
    let accepted = chat
        .directs_to(20)
        .into_iter()
        .find(|text| text.contains("Your accepted wagers"))
        .unwrap();
    assert!(accepted.contains("**Created by:** Alice"));
}

#[tokio::test]
async fn wager_list_for_a_bystander_is_empty() {
    let (engine, chat) = setup().await;

    engine.send_wager_list(30).await.unwrap();

    assert!(
        chat.directs_to(30)
            .iter()
            .any(|text| text.contains("haven't participated in any wagers"))
    );
}

#[tokio::test]
async fn balance_notice_reports_the_breakdown() {
    let (engine, chat) = setup().await;

    engine
        .create_wager(ORIGIN, 10, 30, "rain tomorrow")
        .await
        .unwrap();
    engine.send_balance(10).await.unwrap();

    let notice = chat
        .directs_to(10)
        .into_iter()
        .find(|text| text.contains("tied up"))
        .unwrap();
    assert!(notice.contains("100 doubloons"));
    assert!(notice.contains("30 of which"));
    assert!(notice.contains("70 available"));
}

#[tokio::test]
async fn allowance_credits_every_known_user() {
    let (engine, _chat) = setup().await;

    engine.find_or_create_user(10).await.unwrap();
    engine.find_or_create_user(20).await.unwrap();

    let credited = engine.distribute_allowance(40).await.unwrap();
    assert_eq!(credited, 2);
    assert_eq!(engine.ledger().get(10).await.unwrap().money, 140);
    assert_eq!(engine.ledger().get(20).await.unwrap().money, 140);
}
