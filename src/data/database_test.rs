//! Database tests

use super::*;
use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use crate::error::AppError;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(name: &str, email: &str) -> User {
    User {
        id: EntityId::new().0,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$not-a-real-hash".to_string(),
        created_at: Utc::now(),
    }
}

fn test_movie(name: &str) -> Movie {
    Movie {
        id: EntityId::new().0,
        name: name.to_string(),
        genre: Some("Ficção Científica".to_string()),
        rating: Some("PG-13".to_string()),
        cover_image_url: Some("https://example.com/cover.jpg".to_string()),
        cover_title: Some("Capa".to_string()),
        year: Some("2014".to_string()),
        avg: Some(4.5),
        synopsis: None,
        created_at: Utc::now(),
    }
}

fn test_review(owner: &User, movie: &Movie) -> Review {
    let now = Utc::now();
    Review {
        id: EntityId::new().0,
        title: "Minha Avaliação".to_string(),
        body: Some("Esta é uma avaliação incrível!".to_string()),
        classification: 5.0,
        owner_id: owner.id.clone(),
        content_id: movie.id.clone(),
        created_at: now,
        updated_at: now,
    }
}

async fn seed_review(db: &Database) -> (User, Review) {
    let owner = test_user("alex", "ajs6@gmail.com");
    db.insert_user(&owner).await.unwrap();
    let movie = test_movie("Interestelar");
    db.insert_movie(&movie).await.unwrap();
    let review = test_review(&owner, &movie);
    db.insert_review(&review).await.unwrap();
    (owner, review)
}

#[tokio::test]
async fn test_database_connection() {
    let (db, _temp_dir) = create_test_db().await;
    assert!(db.list_users().await.unwrap().is_empty());
    db.close().await;
}

#[tokio::test]
async fn test_user_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alex", "ajs6@gmail.com");
    assert_ok!(db.insert_user(&user).await);

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "ajs6@gmail.com");

    let by_email = db.get_user_by_email("ajs6@gmail.com").await.unwrap();
    assert!(by_email.is_some());
    // Email lookups are case-sensitive as stored
    assert!(db.get_user_by_email("AJS6@gmail.com").await.unwrap().is_none());

    let patch = UserPatch {
        name: Some("alexandre".to_string()),
        ..Default::default()
    };
    assert!(db.update_user(&user.id, &patch).await.unwrap());
    assert_eq!(db.find_users_by_name("alexandre").await.unwrap().len(), 1);

    assert!(db.delete_user(&user.id).await.unwrap());
    assert!(db.get_user(&user.id).await.unwrap().is_none());
    assert!(!db.delete_user(&user.id).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("paulo", "jnp@gmail.com"))
        .await
        .unwrap();
    let error = assert_err!(db.insert_user(&test_user("outro", "jnp@gmail.com")).await);
    assert!(matches!(error, AppError::Conflict(_)));

    let other = test_user("jj", "jj@gmail.com");
    db.insert_user(&other).await.unwrap();
    let patch = UserPatch {
        email: Some("jnp@gmail.com".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        db.update_user(&other.id, &patch).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_names_are_not_unique() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_user(&test_user("alex", "a1@example.com"))
        .await
        .unwrap();
    db.insert_user(&test_user("alex", "a2@example.com"))
        .await
        .unwrap();

    let users = db.find_users_by_name("alex").await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].email, "a1@example.com");
}

#[tokio::test]
async fn test_follow_toggle_updates_both_sides() {
    let (db, _temp_dir) = create_test_db().await;

    let a = test_user("paulo", "jnp@gmail.com");
    let b = test_user("jj", "jj@gmail.com");
    db.insert_user(&a).await.unwrap();
    db.insert_user(&b).await.unwrap();

    assert!(db.toggle_follow(&a.id, &b.id).await.unwrap());
    assert!(db.is_following(&a.id, &b.id).await.unwrap());

    let a_sets = db.get_follow_sets(&a.id).await.unwrap();
    let b_sets = db.get_follow_sets(&b.id).await.unwrap();
    assert_eq!(a_sets.following, vec![b.id.clone()]);
    assert!(a_sets.followers.is_empty());
    assert_eq!(b_sets.followers, vec![a.id.clone()]);
    assert!(b_sets.following.is_empty());

    // Second toggle removes the edge from both sides
    assert!(!db.toggle_follow(&a.id, &b.id).await.unwrap());
    assert_eq!(db.get_follow_sets(&a.id).await.unwrap(), FollowSets::default());
    assert_eq!(db.get_follow_sets(&b.id).await.unwrap(), FollowSets::default());
}

#[tokio::test]
async fn test_follow_rejects_self_and_missing_users() {
    let (db, _temp_dir) = create_test_db().await;

    let a = test_user("paulo", "jnp@gmail.com");
    db.insert_user(&a).await.unwrap();

    assert!(matches!(
        db.toggle_follow(&a.id, &a.id).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        db.toggle_follow(&a.id, "01HMISSING").await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        db.toggle_follow("01HMISSING", &a.id).await,
        Err(AppError::NotFound)
    ));
    assert_eq!(db.get_follow_sets(&a.id).await.unwrap(), FollowSets::default());
}

#[tokio::test]
async fn test_failed_toggles_release_their_transactions() {
    let (db, _temp_dir) = create_test_db().await;

    let a = test_user("alex", "ajs6@gmail.com");
    let b = test_user("paulo", "jnp@gmail.com");
    db.insert_user(&a).await.unwrap();
    db.insert_user(&b).await.unwrap();

    // More failures than pooled connections, each rolled back
    for _ in 0..12 {
        assert_err!(db.toggle_follow(&a.id, "01HMISSING").await);
        assert_err!(db.toggle_review_like("01HMISSING", &a.id).await);
    }

    assert!(assert_ok!(db.toggle_follow(&a.id, &b.id).await));
    assert_eq!(db.get_follow_sets(&b.id).await.unwrap().followers, vec![a.id.clone()]);
}

#[tokio::test]
async fn test_follow_sets_batch() {
    let (db, _temp_dir) = create_test_db().await;

    let a = test_user("a", "a@example.com");
    let b = test_user("b", "b@example.com");
    let c = test_user("c", "c@example.com");
    for user in [&a, &b, &c] {
        db.insert_user(user).await.unwrap();
    }
    db.toggle_follow(&a.id, &b.id).await.unwrap();
    db.toggle_follow(&c.id, &b.id).await.unwrap();
    db.toggle_follow(&b.id, &a.id).await.unwrap();

    let sets = db
        .get_follow_sets_batch(&[a.id.clone(), b.id.clone(), c.id.clone()])
        .await
        .unwrap();
    assert_eq!(sets[&b.id].followers, vec![a.id.clone(), c.id.clone()]);
    assert_eq!(sets[&b.id].following, vec![a.id.clone()]);
    assert_eq!(sets[&a.id].followers, vec![b.id.clone()]);
    assert_eq!(sets[&c.id].following, vec![b.id.clone()]);
    assert!(sets[&c.id].followers.is_empty());
}

#[tokio::test]
async fn test_delete_user_removes_follow_edges() {
    let (db, _temp_dir) = create_test_db().await;

    let a = test_user("a", "a@example.com");
    let b = test_user("b", "b@example.com");
    db.insert_user(&a).await.unwrap();
    db.insert_user(&b).await.unwrap();
    db.toggle_follow(&a.id, &b.id).await.unwrap();

    db.delete_user(&a.id).await.unwrap();
    assert!(db.get_follow_sets(&b.id).await.unwrap().followers.is_empty());
}

#[tokio::test]
async fn test_review_crud() {
    let (db, _temp_dir) = create_test_db().await;
    let (owner, review) = seed_review(&db).await;

    let stored = db.get_review(&review.id).await.unwrap().unwrap();
    assert_eq!(stored.owner_id, owner.id);
    assert_eq!(stored.classification, 5.0);

    let patch = ReviewPatch {
        title: Some("Avaliação Atualizada".to_string()),
        classification: Some(4.0),
        ..Default::default()
    };
    assert!(db.update_review(&review.id, &patch, Utc::now()).await.unwrap());
    let stored = db.get_review(&review.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Avaliação Atualizada");
    assert_eq!(stored.classification, 4.0);
    assert_eq!(stored.body, review.body);
    assert_eq!(stored.owner_id, owner.id);

    assert_eq!(db.list_reviews().await.unwrap().len(), 1);
    assert!(db.delete_review(&review.id).await.unwrap());
    assert!(!db.delete_review(&review.id).await.unwrap());
    assert!(!db.update_review(&review.id, &patch, Utc::now()).await.unwrap());
}

#[tokio::test]
async fn test_review_like_toggle_twice_restores_state() {
    let (db, _temp_dir) = create_test_db().await;
    let (owner, review) = seed_review(&db).await;
    let fan = test_user("jj", "jj@gmail.com");
    db.insert_user(&fan).await.unwrap();

    db.toggle_review_like(&review.id, &owner.id).await.unwrap();
    let before = db.get_review_likes(&review.id).await.unwrap();

    let liked = db.toggle_review_like(&review.id, &fan.id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.likes, vec![owner.id.clone(), fan.id.clone()]);

    let unliked = db.toggle_review_like(&review.id, &fan.id).await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.likes, before);
    assert_eq!(db.get_review_likes(&review.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_like_missing_review_is_not_found() {
    let (db, _temp_dir) = create_test_db().await;
    let (owner, _review) = seed_review(&db).await;

    assert!(matches!(
        db.toggle_review_like("01HMISSING", &owner.id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_are_not_lost() {
    let (db, _temp_dir) = create_test_db().await;
    let db = Arc::new(db);
    let (_owner, review) = seed_review(&db).await;

    let mut fans = Vec::new();
    for i in 0..8 {
        let fan = test_user(&format!("fan{i}"), &format!("fan{i}@example.com"));
        db.insert_user(&fan).await.unwrap();
        fans.push(fan);
    }

    let handles: Vec<_> = fans
        .iter()
        .map(|fan| {
            let db = Arc::clone(&db);
            let review_id = review.id.clone();
            let user_id = fan.id.clone();
            tokio::spawn(async move { db.toggle_review_like(&review_id, &user_id).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().liked);
    }

    let likes = db.get_review_likes(&review.id).await.unwrap();
    assert_eq!(likes.len(), fans.len());
    for fan in &fans {
        assert!(likes.contains(&fan.id));
    }
}

#[tokio::test]
async fn test_comments_order_and_cascade() {
    let (db, _temp_dir) = create_test_db().await;
    let (owner, review) = seed_review(&db).await;

    let mut ids = Vec::new();
    for body in ["primeiro", "segundo", "terceiro"] {
        let comment = Comment {
            id: EntityId::new().0,
            body: Some(body.to_string()),
            owner_id: owner.id.clone(),
            review_id: review.id.clone(),
            created_at: Utc::now(),
        };
        db.insert_comment(&comment).await.unwrap();
        ids.push(comment.id);
    }

    assert_eq!(db.get_review_comment_ids(&review.id).await.unwrap(), ids);

    let liked = db.toggle_comment_like(&ids[0], &owner.id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(db.get_comment_likes(&ids[0]).await.unwrap(), vec![owner.id.clone()]);

    assert!(db.delete_comment(&ids[1]).await.unwrap());
    assert_eq!(
        db.get_review_comment_ids(&review.id).await.unwrap(),
        vec![ids[0].clone(), ids[2].clone()]
    );

    let relations = db
        .get_review_relations_batch(&[review.id.clone()])
        .await
        .unwrap();
    assert_eq!(relations[&review.id].1.len(), 2);

    db.delete_review(&review.id).await.unwrap();
    assert!(db.get_comment(&ids[0]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_movie_crud_by_name() {
    let (db, _temp_dir) = create_test_db().await;

    let movie = test_movie("Interestelar");
    db.insert_movie(&movie).await.unwrap();
    assert!(matches!(
        db.insert_movie(&test_movie("Interestelar")).await,
        Err(AppError::Conflict(_))
    ));

    let patch = MoviePatch {
        avg: Some(4.8),
        synopsis: Some("Exploradores atravessam um buraco de minhoca.".to_string()),
        ..Default::default()
    };
    assert!(db.update_movie_by_name("Interestelar", &patch).await.unwrap());
    let stored = db.get_movie_by_name("Interestelar").await.unwrap().unwrap();
    assert_eq!(stored.avg, Some(4.8));
    assert_eq!(stored.genre, movie.genre);

    // Empty patch still reports existence
    assert!(db
        .update_movie_by_name("Interestelar", &MoviePatch::default())
        .await
        .unwrap());
    assert!(!db
        .update_movie_by_name("Matrix", &MoviePatch::default())
        .await
        .unwrap());

    assert!(db.delete_movie_by_name("Interestelar").await.unwrap());
    assert!(db.list_movies().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_notes_are_unique_per_user_and_title() {
    let (db, _temp_dir) = create_test_db().await;

    let user = test_user("alex", "ajs6@gmail.com");
    db.insert_user(&user).await.unwrap();

    let now = Utc::now();
    let note = Note {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        title: "O Cavaleiro das Trevas".to_string(),
        note: "um ótimo filme".to_string(),
        created_at: now,
        updated_at: now,
    };
    db.insert_note(&note).await.unwrap();

    let duplicate = Note {
        id: EntityId::new().0,
        ..note.clone()
    };
    assert!(matches!(
        db.insert_note(&duplicate).await,
        Err(AppError::Conflict(_))
    ));

    let found = db
        .find_notes(Some("ajs6@gmail.com"), Some("O Cavaleiro das Trevas"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(db
        .find_notes(Some("jj@gmail.com"), None)
        .await
        .unwrap()
        .is_empty());

    assert!(db
        .update_note(&user.id, &note.title, "uma obra-prima", Utc::now())
        .await
        .unwrap());
    assert_eq!(
        db.get_notes_by_user(&user.id).await.unwrap()[0].note,
        "uma obra-prima"
    );

    assert!(db.delete_note(&user.id, &note.title).await.unwrap());
    assert!(!db.delete_note(&user.id, &note.title).await.unwrap());
}

#[tokio::test]
async fn test_member_lists() {
    let (db, _temp_dir) = create_test_db().await;

    let list = MemberList {
        list_type: ListType::Watched.as_str().to_string(),
        name: "Minha Lista Assistida".to_string(),
        created_at: Utc::now(),
    };
    db.insert_list(&list).await.unwrap();
    assert!(matches!(db.insert_list(&list).await, Err(AppError::Conflict(_))));

    let member = ListMember {
        id: EntityId::new().0,
        list_type: list.list_type.clone(),
        name: "João".to_string(),
        gender: Some("Masculino".to_string()),
        description: Some("Um ótimo personagem!".to_string()),
        user_avaliation: Some(5.0),
        created_at: Utc::now(),
    };
    db.insert_list_member(&member).await.unwrap();
    assert!(matches!(
        db.insert_list_member(&ListMember {
            id: EntityId::new().0,
            ..member.clone()
        })
        .await,
        Err(AppError::Conflict(_))
    ));

    let patch = MemberPatch {
        user_avaliation: Some(3.0),
        ..Default::default()
    };
    assert!(db
        .update_list_member(ListType::Watched, "João", &patch)
        .await
        .unwrap());
    let stored = db
        .get_list_member(ListType::Watched, "João")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.user_avaliation, Some(3.0));
    assert_eq!(stored.gender.as_deref(), Some("Masculino"));

    assert!(db
        .get_list_member(ListType::Abandoned, "João")
        .await
        .unwrap()
        .is_none());

    assert!(db.delete_list(ListType::Watched).await.unwrap());
    assert!(db.get_list_members(ListType::Watched).await.unwrap().is_empty());
}
