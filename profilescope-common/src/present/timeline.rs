use crate::model::{
    Id,
    comment::Comment,
    post::{Post, PostMarker},
};
use std::collections::HashMap;

pub const POPULAR_REACTIONS_THRESHOLD: u64 = 100;

pub type PostComments = HashMap<Id<PostMarker>, Vec<Comment>>;

/// Saturates at `u64::MAX`.
#[must_use]
pub fn total_reactions(post: &Post) -> u64 {
    post.reactions.likes.saturating_add(post.reactions.dislikes)
}

/// Share of likes among all reactions, rounded half up. Zero when nobody reacted.
#[must_use]
pub fn like_percentage(post: &Post) -> u64 {
    let total = u128::from(total_reactions(post));
    if total == 0 {
        return 0;
    }

    let likes = u128::from(post.reactions.likes);
    let percentage = (likes * 200 + total) / (total * 2);
    u64::try_from(percentage).unwrap_or(100)
}

/// `1_500` becomes `1K`, `2_500_000` becomes `2M`. Truncates instead of rounding.
#[must_use]
pub fn abbreviate_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{}M", n / 1_000_000)
    } else if n >= 1_000 {
        format!("{}K", n / 1_000)
    } else {
        n.to_string()
    }
}

#[must_use]
pub fn is_popular(post: &Post) -> bool {
    total_reactions(post) > POPULAR_REACTIONS_THRESHOLD
}

#[must_use]
pub fn comments_for(comments: &PostComments, post_id: Id<PostMarker>) -> &[Comment] {
    comments.get(&post_id).map_or(&[], Vec::as_slice)
}
