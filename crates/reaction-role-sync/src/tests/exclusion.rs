//! One role per category under arbitrary event sequences.

use super::harness::*;
use crate::ids::{EmojiKey, RoleId, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Small deterministic generator so failures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

fn colour_role(emoji: &EmojiKey) -> RoleId {
    match emoji {
        EmojiKey::Custom(1) => RED,
        EmojiKey::Custom(2) => GREEN,
        EmojiKey::Custom(3) => BLUE,
        other => panic!("not a colour emoji: {other}"),
    }
}

fn held_colours(platform: &FakePlatform, user_id: UserId) -> BTreeSet<RoleId> {
    platform
        .roles_of(user_id)
        .into_iter()
        .filter(|role| [RED, GREEN, BLUE].contains(role))
        .collect()
}

/// Random add/remove sequences, with the bot's own removal events fed back,
/// always leave each member with at most one colour role, matching their
/// single remaining reaction.
#[tokio::test]
async fn random_sequences_keep_one_role_per_category() {
    let users = [UserId(601), UserId(602), UserId(603)];

    for seed in [1u64, 7, 42, 1234] {
        let platform = Arc::new(FakePlatform::new());
        let engine = fixture_engine(platform.clone());
        let mut rng = Lcg(seed);

        for _ in 0..200 {
            let user = users[rng.next(users.len() as u64) as usize];
            let pick = emoji(rng.next(3) + 1);
            let reacting = platform.reactions_of(COLOUR_MSG, user).contains(&pick);

            if rng.next(3) == 0 {
                if !reacting {
                    continue;
                }
                unreact(&engine, &platform, COLOUR_MSG, pick, user).await;
            } else {
                if reacting {
                    continue;
                }
                react(&engine, &platform, COLOUR_MSG, pick, user).await;
            }
            deliver_emitted(&engine, &platform).await;

            for user in users {
                let held = held_colours(&platform, user);
                assert!(held.len() <= 1, "seed {seed}: {user} holds {held:?}");

                let expected: BTreeSet<RoleId> = platform
                    .reactions_of(COLOUR_MSG, user)
                    .iter()
                    .map(colour_role)
                    .collect();
                assert_eq!(held, expected, "seed {seed}: {user} roles diverge from reactions");
            }
        }
    }
}

/// Selecting every colour in turn ends with only the last one.
#[tokio::test]
async fn cycling_through_a_category_keeps_only_the_last() {
    let platform = Arc::new(FakePlatform::new());
    let engine = fixture_engine(platform.clone());
    let user = UserId(610);

    for round in 0..3 {
        for n in 1..=3 {
            react(&engine, &platform, COLOUR_MSG, emoji(n), user).await;
            deliver_emitted(&engine, &platform).await;
            assert_eq!(held_colours(&platform, user).len(), 1, "round {round}, emoji {n}");
        }
    }

    assert_eq!(held_colours(&platform, user), role_set(&[BLUE]));
    assert_eq!(platform.reactions_of(COLOUR_MSG, user), emoji_set(&[3]));
}
