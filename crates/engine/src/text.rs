//! Outward message copy.
//!
//! All user-visible strings live here so the lifecycle and settlement code
//! stays free of formatting noise.

use crate::{WagerStatus, ledger::BalanceSummary, wagers::Wager};

const SEPARATOR: &str =
    "\n-----------------------------------------------------------------------------";

pub(crate) fn welcome() -> String {
    "Welcome to the wager pit! You've been staked with a pile of doubloons. \
     Create a wager with an amount and a condition, and may the best bettor win."
        .to_string()
}

pub(crate) fn proposed_announcement(creator_name: &str, wager: &Wager) -> String {
    format!(
        "{creator_name} wagered {} - condition: **{}**.\n\
         React to **this** message with `:wagerin:` to accept the wager!",
        wager.amount, wager.description
    )
}

pub(crate) fn accepted_announcement(creator_name: &str, taker_name: &str, wager: &Wager) -> String {
    format!(
        "{creator_name} wagered {} - condition: **{}**.\n\
         {taker_name} accepted - winner react to **this** message with `:wagerwin:` \
         and loser react with `:wagerlose:`",
        wager.amount, wager.description
    )
}

pub(crate) fn resolved_announcement(
    creator_name: &str,
    winner_name: &str,
    loser_name: &str,
    wager: &Wager,
) -> String {
    format!(
        "{creator_name} wagered {} - condition: **{}**.\n\
         {winner_name} won the wager against {loser_name}!",
        wager.amount, wager.description
    )
}

/// Strike-through edit applied to a canceled announcement.
pub(crate) fn struck(text: &str) -> String {
    format!("~~{text}~~")
}

pub(crate) fn not_a_real_bet(amount: i64) -> String {
    format!("You think that {amount} is a real bet?!")
}

pub(crate) fn cannot_afford_create(balance: &BalanceSummary) -> String {
    format!(
        "You don't got the dough \u{1F4B8}\n\
         You've got {} doubloons and {} are in outstanding bets, \
         leaving {} doubloons available!",
        balance.money,
        balance.outstanding,
        balance.available()
    )
}

pub(crate) fn cannot_afford_accept(wager: &Wager, balance: &BalanceSummary) -> String {
    format!(
        "You don't have enough moolah to take that wager! \u{1F4B8}\n\
         **Description:** {}\n**Amount:** {}\n\
         You've got {} doubloons and {} are in outstanding bets, \
         leaving {} doubloons available!",
        wager.description,
        wager.amount,
        balance.money,
        balance.outstanding,
        balance.available()
    )
}

pub(crate) fn self_acceptance() -> String {
    "You can't accept your own wager - your :wagerin: reaction has been removed".to_string()
}

pub(crate) fn direct_message_context() -> String {
    "Can't create a wager in a direct message, sorry".to_string()
}

pub(crate) fn provisioning_failed() -> String {
    "Sorry, an unknown error occurred when retrieving your user information!".to_string()
}

pub(crate) fn accepted_taker_notice(creator_name: &str, wager: &Wager, link: &str) -> String {
    format!(
        "You've accepted a wager from {creator_name} for {}.\nCondition: {}\n{link}",
        wager.amount, wager.description
    )
}

pub(crate) fn accepted_creator_notice(taker_name: &str, link: &str) -> String {
    format!("{taker_name} accepted your wager!\n{link}")
}

pub(crate) fn won_notice(loser_name: &str, amount: i64, link: &str) -> String {
    format!(
        "You won your wager against {loser_name}! You have received {amount}.\n{link}"
    )
}

pub(crate) fn lost_notice(winner_name: &str, amount: i64, link: &str) -> String {
    format!("You lost your wager against {winner_name}! You have lost {amount}.\n{link}")
}

pub(crate) fn canceled_notice(wager_id: i32) -> String {
    format!("Canceled bet with ID {wager_id}")
}

pub(crate) fn counterparty_canceled_notice(departed_name: &str, wager: &Wager) -> String {
    format!(
        "{departed_name} left the community, so your wager for {} (condition: {}) \
         has been canceled. No doubloons changed hands.",
        wager.amount, wager.description
    )
}

pub(crate) fn no_wager_found(wager_id: i32) -> String {
    format!("No outstanding wager with an ID of {wager_id} found")
}

pub(crate) fn balance_notice(balance: &BalanceSummary) -> String {
    format!(
        "You have {} doubloons, {} of which are tied up in outstanding bets. \
         This leaves you {} available.",
        balance.money,
        balance.outstanding,
        balance.available()
    )
}

pub(crate) fn list_empty() -> String {
    let mut content = String::from("__**Your wagers:**__");
    content.push_str(SEPARATOR);
    content.push_str(
        "\n__You haven't participated in any wagers yet!__ Type `!help wager` to get started.",
    );
    content
}

pub(crate) fn list_created_header() -> String {
    format!("__**Your wagers:**__{SEPARATOR}\n__Your created wagers:__{SEPARATOR}")
}

pub(crate) fn list_accepted_header() -> String {
    format!("\n__Your accepted wagers:__{SEPARATOR}")
}

/// One entry of the `list` output. `counterparty_label` is "Accepted by" for
/// created wagers and "Created by" for accepted ones.
pub(crate) fn list_entry(
    wager: &Wager,
    counterparty_label: &str,
    counterparty_name: &str,
    winner_name: Option<&str>,
    link: &str,
) -> String {
    let winner_text = match winner_name {
        Some(name) => format!(" **Winner:** {name}"),
        None => String::new(),
    };
    format!(
        "\n**Amount:** {} **{counterparty_label}:** {counterparty_name} \
         **Status:** {}{winner_text}\n**Description:** {}\n**Link:** {link}{SEPARATOR}",
        wager.amount,
        wager.status().as_str(),
        wager.description
    )
}

pub(crate) fn cancellable_header() -> String {
    format!("__**Your Outstanding Wagers**__  (Cancel with !cancel `id`){SEPARATOR}")
}

pub(crate) fn cancellable_entry(wager: &Wager, link: &str) -> String {
    format!(
        "\n**ID:** {} **Amount:** {}\n**Description:** {}\n**Link:** {link}{SEPARATOR}",
        wager.id, wager.amount, wager.description
    )
}

impl WagerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::Complete => "Complete",
        }
    }
}
