use crate::model::{
    Id,
    post::PostMarker,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post_id: Id<PostMarker>,
    pub body: String,
    pub likes: u64,
    pub user: Commenter,
}

/// The commenter summary the directory embeds in every comment.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commenter {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub full_name: String,
}
