use std::collections::{HashMap, HashSet};
use threadscout_core::Post;

/// Merge collected posts by id. The first occurrence wins and the result
/// keeps first-seen order.
pub fn dedupe_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::with_capacity(posts.len());
    posts
        .into_iter()
        .filter(|post| seen.insert(post.id.clone()))
        .collect()
}

pub fn counts_by_subreddit(posts: &[Post]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for post in posts {
        *counts.entry(post.subreddit.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, subreddit: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            title: title.to_string(),
            body: "body".to_string(),
            permalink: format!("https://www.reddit.com/r/{}/comments/{}/", subreddit, id),
            author: "author".to_string(),
            score: 20,
            created_utc: 1640995200,
            num_comments: 9,
            subreddit: subreddit.to_string(),
            top_comments: Vec::new(),
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let posts = vec![
            post("a", "rust", "first"),
            post("b", "rust", "other"),
            post("a", "rust", "second"),
        ];

        let deduped = dedupe_posts(posts);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "a");
        assert_eq!(deduped[0].title, "first");
        assert_eq!(deduped[1].id, "b");
    }

    #[test]
    fn order_follows_first_seen() {
        let posts = vec![
            post("c", "rust", "c"),
            post("a", "golang", "a"),
            post("b", "rust", "b"),
            post("a", "golang", "dup"),
        ];

        let deduped = dedupe_posts(posts);
        let ids: Vec<&str> = deduped.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn counts_follow_deduplicated_set() {
        let deduped = dedupe_posts(vec![
            post("a", "rust", "a"),
            post("b", "rust", "b"),
            post("c", "golang", "c"),
            post("a", "rust", "dup"),
        ]);

        let counts = counts_by_subreddit(&deduped);
        assert_eq!(counts.get("rust"), Some(&2));
        assert_eq!(counts.get("golang"), Some(&1));
    }
}
