//! Paginated wrappers the directory puts around entity lists.
//!
//! Each entity is listed under its own key (`users`, `posts`, `comments`), so every envelope is
//! its own type. Only the item list is of interest to callers; the counters are kept for logging.

use crate::model::{comment::Comment, post::Post, user::UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PageInfo {
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

pub trait Envelope {
    type Item;

    fn page_info(&self) -> PageInfo;

    fn into_items(self) -> Vec<Self::Item>;
}

macro_rules! envelope {
    ($name:ident { $key:ident: Vec<$item:ty> }) => {
        #[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
        pub struct $name {
            pub $key: Vec<$item>,
            pub total: u64,
            pub skip: u64,
            pub limit: u64,
        }

        impl Envelope for $name {
            type Item = $item;

            fn page_info(&self) -> PageInfo {
                PageInfo {
                    total: self.total,
                    skip: self.skip,
                    limit: self.limit,
                }
            }

            fn into_items(self) -> Vec<$item> {
                self.$key
            }
        }
    };
}

envelope!(UsersPage { users: Vec<UserProfile> });
envelope!(PostsPage { posts: Vec<Post> });
envelope!(CommentsPage { comments: Vec<Comment> });

#[cfg(test)]
mod tests {
    use crate::model::envelope::{CommentsPage, Envelope, PageInfo, PostsPage, UsersPage};

    #[test]
    fn users_page_discards_pagination() {
        let json = r#"{
            "users": [{
                "id": 5, "firstName": "Alice", "lastName": "Doe", "email": "a@d",
                "username": "alice", "image": "i"
            }],
            "total": 1, "skip": 0, "limit": 1
        }"#;

        let page: UsersPage = serde_json::from_str(json).unwrap();
        assert_eq!(
            page.page_info(),
            PageInfo {
                total: 1,
                skip: 0,
                limit: 1
            }
        );
        let users = page.into_items();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username.get(), "alice");
    }

    #[test]
    fn empty_pages_decode() {
        let posts: PostsPage =
            serde_json::from_str(r#"{"posts": [], "total": 0, "skip": 0, "limit": 0}"#).unwrap();
        assert!(posts.into_items().is_empty());

        let comments: CommentsPage =
            serde_json::from_str(r#"{"comments": [], "total": 0, "skip": 0, "limit": 30}"#)
                .unwrap();
        assert!(comments.into_items().is_empty());
    }

    #[test]
    fn wrong_entity_key_is_rejected() {
        assert!(
            serde_json::from_str::<PostsPage>(r#"{"users": [], "total": 0, "skip": 0, "limit": 0}"#)
                .is_err()
        );
    }
}
