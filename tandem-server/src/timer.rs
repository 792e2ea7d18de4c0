//! Auto-neutral choice timer
//!
//! When `choice_timeout_secs` is set, each card shown to a participant gets a
//! deadline. If the participant is still on that card in the same round when
//! it expires, a `NEUTRAL` choice is made on its behalf through the normal
//! command path.

use std::time::Duration;

use tandem_common::events::{Command, Notification, Outbound};
use tandem_common::session::PendingItem;
use tandem_common::{Choice, ParticipantId};
use tracing::{debug, info};

use crate::AppState;

/// Arm a timer for every `showItem` in the batch
pub async fn arm_for_batch(state: &AppState, batch: &[Outbound]) {
    for outbound in batch {
        let Notification::ShowItem { item, .. } = &outbound.notification else {
            continue;
        };
        for participant in outbound.target.recipients() {
            // Pin the deadline to the round the card was dealt in
            match state.lobby.pending_item(participant).await {
                Some(pending) if pending.item.id == item.id => {
                    arm(state.clone(), participant.clone(), pending);
                }
                _ => debug!(%participant, item_id = %item.id, "Card already answered, no timer"),
            }
        }
    }
}

fn arm(state: AppState, participant: ParticipantId, card: PendingItem) {
    let deadline = Duration::from_secs(state.config.choice_timeout_secs);
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        fire(state, participant, card).await;
    });
}

async fn fire(state: AppState, participant: ParticipantId, card: PendingItem) {
    if state.lobby.pending_item(&participant).await.as_ref() != Some(&card) {
        return;
    }

    info!(
        %participant,
        item_id = %card.item.id,
        round = card.round_number,
        "Choice timed out, voting neutral"
    );
    crate::dispatch(
        &state,
        &participant,
        Command::MakeChoice {
            item_id: card.item.id,
            choice: Choice::Neutral,
        },
    )
    .await;
}
