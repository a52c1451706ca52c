//! SQLite database operations
//!
//! All database access goes through this module.
//! Set-valued fields (followers, following, likes) live in edge tables keyed
//! by the pair, so every toggle is a single-row insert or delete.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::models::*;
use crate::error::{AppError, conflict_on_unique};

const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Edge table that stores a like set
#[derive(Debug, Clone, Copy)]
enum LikeTarget {
    Review,
    Comment,
}

impl LikeTarget {
    fn edge_table(self) -> &'static str {
        match self {
            Self::Review => "review_likes",
            Self::Comment => "comment_likes",
        }
    }

    fn target_table(self) -> &'static str {
        match self {
            Self::Review => "reviews",
            Self::Comment => "comments",
        }
    }

    fn key_column(self) -> &'static str {
        match self {
            Self::Review => "review_id",
            Self::Comment => "comment_id",
        }
    }
}

async fn row_exists(
    conn: &mut sqlx::SqliteConnection,
    table: &str,
    id: &str,
) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, i64>(&format!("SELECT 1 FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// Database connection pool wrapper.
///
/// Constructed once at startup and shared through `AppState`.
/// Call [`Database::close`] on shutdown to drain the pool.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// `Conflict` if the email is already registered
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email is already registered"))?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by email (exact, case-sensitive match)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get all users sharing a display name, oldest first
    pub async fn find_users_by_name(&self, name: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE name = ? ORDER BY created_at, rowid",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Get all users, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Patch user fields by ID
    ///
    /// # Returns
    /// `true` if a matching user exists, `false` otherwise.
    ///
    /// # Errors
    /// `Conflict` if the new email belongs to another user
    pub async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<bool, AppError> {
        if patch.is_empty() {
            return Ok(self.get_user(id).await?.is_some());
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        {
            let mut separated = query_builder.separated(", ");
            if let Some(name) = &patch.name {
                separated.push("name = ").push_bind_unseparated(name);
            }
            if let Some(email) = &patch.email {
                separated.push("email = ").push_bind_unseparated(email);
            }
            if let Some(password_hash) = &patch.password_hash {
                separated
                    .push("password_hash = ")
                    .push_bind_unseparated(password_hash);
            }
        }
        query_builder.push(" WHERE id = ").push_bind(id);

        let result = query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email is already registered"))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete user by ID
    ///
    /// Follow edges, likes, reviews, comments and notes of the user are
    /// removed by cascade.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Follow graph
    // =========================================================================

    /// Get follower and following sets for one user
    pub async fn get_follow_sets(&self, user_id: &str) -> Result<FollowSets, AppError> {
        let mut sets = self.get_follow_sets_batch(&[user_id.to_string()]).await?;
        Ok(sets.remove(user_id).unwrap_or_default())
    }

    /// Get follower and following sets for many users (batch operation to avoid N+1)
    pub async fn get_follow_sets_batch(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, FollowSets>, AppError> {
        let mut sets: HashMap<String, FollowSets> = user_ids
            .iter()
            .map(|id| (id.clone(), FollowSets::default()))
            .collect();
        if user_ids.is_empty() {
            return Ok(sets);
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT follower_id, following_id FROM follows WHERE follower_id IN (",
        );
        {
            let mut separated = query_builder.separated(", ");
            for id in user_ids {
                separated.push_bind(id);
            }
        }
        query_builder.push(") OR following_id IN (");
        {
            let mut separated = query_builder.separated(", ");
            for id in user_ids {
                separated.push_bind(id);
            }
        }
        query_builder.push(") ORDER BY created_at, rowid");

        let edges = query_builder
            .build_query_as::<(String, String)>()
            .fetch_all(&self.pool)
            .await?;

        for (follower_id, following_id) in edges {
            if let Some(entry) = sets.get_mut(&follower_id) {
                entry.following.push(following_id.clone());
            }
            if let Some(entry) = sets.get_mut(&following_id) {
                entry.followers.push(follower_id);
            }
        }

        Ok(sets)
    }

    /// Check if `follower_id` follows `following_id`
    #[cfg(test)]
    pub(crate) async fn is_following(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Toggle the follow edge `follower_id -> following_id`
    ///
    /// Uses an IMMEDIATE transaction so the existence checks and the edge
    /// mutation are atomic. The edge row is the single source of both the
    /// follower's `following` set and the target's `followers` set.
    ///
    /// # Returns
    /// `true` if the edge exists after the call (followed), `false` if it
    /// was removed (unfollowed).
    ///
    /// # Errors
    /// `NotFound` if either user does not exist; nothing is written.
    pub async fn toggle_follow(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> Result<bool, AppError> {
        if follower_id == following_id {
            return Err(AppError::Validation("users cannot follow themselves".to_string()));
        }

        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<bool, AppError> = async {
            if !row_exists(&mut *conn, "users", follower_id).await?
                || !row_exists(&mut *conn, "users", following_id).await?
            {
                return Err(AppError::NotFound);
            }

            let removed =
                sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
                    .bind(follower_id)
                    .bind(following_id)
                    .execute(&mut *conn)
                    .await?;
            if removed.rows_affected() > 0 {
                return Ok(false);
            }

            sqlx::query(
                "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(follower_id)
            .bind(following_id)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

            Ok(true)
        }
        .await;

        match result {
            Ok(following) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(following)
            }
            Err(error) => {
                if let Err(rollback_error) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::warn!(error = %rollback_error, "Failed to roll back transaction");
                }
                Err(error)
            }
        }
    }

    // =========================================================================
    // Likes
    // =========================================================================

    async fn get_likes(&self, target: LikeTarget, target_id: &str) -> Result<Vec<String>, AppError> {
        let query = format!(
            "SELECT user_id FROM {} WHERE {} = ? ORDER BY created_at, rowid",
            target.edge_table(),
            target.key_column()
        );
        let likes = sqlx::query_scalar::<_, String>(&query)
            .bind(target_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(likes)
    }

    /// Toggle a like edge inside one IMMEDIATE transaction.
    ///
    /// Delete-then-insert on the `(target, user)` primary key: concurrent
    /// toggles by different users touch different rows and are serialized
    /// by SQLite's write lock, so none are lost.
    async fn toggle_like(
        &self,
        target: LikeTarget,
        target_id: &str,
        user_id: &str,
    ) -> Result<LikeState, AppError> {
        let edge_table = target.edge_table();
        let key_column = target.key_column();

        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<LikeState, AppError> = async {
            if !row_exists(&mut *conn, target.target_table(), target_id).await?
                || !row_exists(&mut *conn, "users", user_id).await?
            {
                return Err(AppError::NotFound);
            }

            let removed = sqlx::query(&format!(
                "DELETE FROM {edge_table} WHERE {key_column} = ? AND user_id = ?"
            ))
            .bind(target_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

            let liked = removed.rows_affected() == 0;
            if liked {
                sqlx::query(&format!(
                    "INSERT INTO {edge_table} ({key_column}, user_id, created_at) VALUES (?, ?, ?)"
                ))
                .bind(target_id)
                .bind(user_id)
                .bind(Utc::now())
                .execute(&mut *conn)
                .await?;
            }

            let likes = sqlx::query_scalar::<_, String>(&format!(
                "SELECT user_id FROM {edge_table} WHERE {key_column} = ? ORDER BY created_at, rowid"
            ))
            .bind(target_id)
            .fetch_all(&mut *conn)
            .await?;

            Ok(LikeState { liked, likes })
        }
        .await;

        match result {
            Ok(state) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(state)
            }
            Err(error) => {
                if let Err(rollback_error) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::warn!(error = %rollback_error, "Failed to roll back transaction");
                }
                Err(error)
            }
        }
    }

    // =========================================================================
    // Movies
    // =========================================================================

    /// Insert a new movie
    ///
    /// # Errors
    /// `Conflict` if a movie with the same name exists
    pub async fn insert_movie(&self, movie: &Movie) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO movies (
                id, name, genre, rating, cover_image_url, cover_title,
                year, avg, synopsis, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&movie.id)
        .bind(&movie.name)
        .bind(&movie.genre)
        .bind(&movie.rating)
        .bind(&movie.cover_image_url)
        .bind(&movie.cover_title)
        .bind(&movie.year)
        .bind(movie.avg)
        .bind(&movie.synopsis)
        .bind(movie.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a movie with this name already exists"))?;

        Ok(())
    }

    /// Get movie by ID
    pub async fn get_movie(&self, id: &str) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    /// Get movie by name
    pub async fn get_movie_by_name(&self, name: &str) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    /// Get all movies ordered by name
    pub async fn list_movies(&self) -> Result<Vec<Movie>, AppError> {
        let movies = sqlx::query_as::<_, Movie>("SELECT * FROM movies ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(movies)
    }

    /// Patch movie fields, addressed by current name
    ///
    /// # Returns
    /// `true` if a movie with that name exists.
    pub async fn update_movie_by_name(
        &self,
        name: &str,
        patch: &MoviePatch,
    ) -> Result<bool, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new("UPDATE movies SET ");
        {
            let mut separated = query_builder.separated(", ");
            // Keeps the statement valid when the patch is empty.
            separated.push("id = id");
            if let Some(value) = &patch.name {
                separated.push("name = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.genre {
                separated.push("genre = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.rating {
                separated.push("rating = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.cover_image_url {
                separated
                    .push("cover_image_url = ")
                    .push_bind_unseparated(value);
            }
            if let Some(value) = &patch.cover_title {
                separated.push("cover_title = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.year {
                separated.push("year = ").push_bind_unseparated(value);
            }
            if let Some(value) = patch.avg {
                separated.push("avg = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.synopsis {
                separated.push("synopsis = ").push_bind_unseparated(value);
            }
        }
        query_builder.push(" WHERE name = ").push_bind(name);

        let result = query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "a movie with this name already exists"))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete movie by name
    ///
    /// Reviews of the movie are removed by cascade.
    pub async fn delete_movie_by_name(&self, name: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM movies WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Insert a new review
    pub async fn insert_review(&self, review: &Review) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, title, body, classification, owner_id, content_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&review.id)
        .bind(&review.title)
        .bind(&review.body)
        .bind(review.classification)
        .bind(&review.owner_id)
        .bind(&review.content_id)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get review by ID
    pub async fn get_review(&self, id: &str) -> Result<Option<Review>, AppError> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    /// Get all reviews, newest first
    pub async fn list_reviews(&self) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Patch review fields by ID
    ///
    /// `owner_id` and `content_id` are not patchable.
    pub async fn update_review(
        &self,
        id: &str,
        patch: &ReviewPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new("UPDATE reviews SET ");
        {
            let mut separated = query_builder.separated(", ");
            separated.push("updated_at = ").push_bind_unseparated(updated_at);
            if let Some(title) = &patch.title {
                separated.push("title = ").push_bind_unseparated(title);
            }
            if let Some(body) = &patch.body {
                separated.push("body = ").push_bind_unseparated(body);
            }
            if let Some(classification) = patch.classification {
                separated
                    .push("classification = ")
                    .push_bind_unseparated(classification);
            }
        }
        query_builder.push(" WHERE id = ").push_bind(id);

        let result = query_builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete review by ID
    ///
    /// Comments and likes are removed by cascade.
    pub async fn delete_review(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get user IDs that like a review, oldest like first
    pub async fn get_review_likes(&self, review_id: &str) -> Result<Vec<String>, AppError> {
        self.get_likes(LikeTarget::Review, review_id).await
    }

    /// Toggle `user_id`'s like on a review
    ///
    /// # Errors
    /// `NotFound` if the review or the user does not exist
    pub async fn toggle_review_like(
        &self,
        review_id: &str,
        user_id: &str,
    ) -> Result<LikeState, AppError> {
        self.toggle_like(LikeTarget::Review, review_id, user_id)
            .await
    }

    /// Get comment IDs of a review in creation order
    pub async fn get_review_comment_ids(&self, review_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM comments WHERE review_id = ? ORDER BY created_at, rowid",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Get likes and comment IDs for many reviews (batch operation to avoid N+1)
    ///
    /// # Returns
    /// Map of review ID to `(likes, comment_ids)`.
    pub async fn get_review_relations_batch(
        &self,
        review_ids: &[String],
    ) -> Result<HashMap<String, (Vec<String>, Vec<String>)>, AppError> {
        let mut relations: HashMap<String, (Vec<String>, Vec<String>)> = review_ids
            .iter()
            .map(|id| (id.clone(), (Vec::new(), Vec::new())))
            .collect();
        if review_ids.is_empty() {
            return Ok(relations);
        }

        let mut likes_query = QueryBuilder::<Sqlite>::new(
            "SELECT review_id, user_id FROM review_likes WHERE review_id IN (",
        );
        {
            let mut separated = likes_query.separated(", ");
            for id in review_ids {
                separated.push_bind(id);
            }
        }
        likes_query.push(") ORDER BY created_at, rowid");

        let likes = likes_query
            .build_query_as::<(String, String)>()
            .fetch_all(&self.pool)
            .await?;
        for (review_id, user_id) in likes {
            if let Some((review_likes, _)) = relations.get_mut(&review_id) {
                review_likes.push(user_id);
            }
        }

        let mut comments_query =
            QueryBuilder::<Sqlite>::new("SELECT review_id, id FROM comments WHERE review_id IN (");
        {
            let mut separated = comments_query.separated(", ");
            for id in review_ids {
                separated.push_bind(id);
            }
        }
        comments_query.push(") ORDER BY created_at, rowid");

        let comments = comments_query
            .build_query_as::<(String, String)>()
            .fetch_all(&self.pool)
            .await?;
        for (review_id, comment_id) in comments {
            if let Some((_, review_comments)) = relations.get_mut(&review_id) {
                review_comments.push(comment_id);
            }
        }

        Ok(relations)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a new comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO comments (id, body, owner_id, review_id, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.body)
        .bind(&comment.owner_id)
        .bind(&comment.review_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Delete comment by ID
    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get user IDs that like a comment, oldest like first
    #[cfg(test)]
    pub(crate) async fn get_comment_likes(&self, comment_id: &str) -> Result<Vec<String>, AppError> {
        self.get_likes(LikeTarget::Comment, comment_id).await
    }

    /// Toggle `user_id`'s like on a comment
    pub async fn toggle_comment_like(
        &self,
        comment_id: &str,
        user_id: &str,
    ) -> Result<LikeState, AppError> {
        self.toggle_like(LikeTarget::Comment, comment_id, user_id)
            .await
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// Insert a new note
    ///
    /// # Errors
    /// `Conflict` if the user already has a note with the same title
    pub async fn insert_note(&self, note: &Note) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notes (id, user_id, title, note, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.id)
        .bind(&note.user_id)
        .bind(&note.title)
        .bind(&note.note)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a note with this title already exists"))?;

        Ok(())
    }

    /// Get all notes of a user in creation order
    pub async fn get_notes_by_user(&self, user_id: &str) -> Result<Vec<Note>, AppError> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE user_id = ? ORDER BY created_at, rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Find notes by optional owner email and optional exact title
    pub async fn find_notes(
        &self,
        email: Option<&str>,
        title: Option<&str>,
    ) -> Result<Vec<Note>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT n.* FROM notes n JOIN users u ON u.id = n.user_id WHERE 1 = 1",
        );
        if let Some(email) = email {
            query_builder.push(" AND u.email = ").push_bind(email);
        }
        if let Some(title) = title {
            query_builder.push(" AND n.title = ").push_bind(title);
        }
        query_builder.push(" ORDER BY n.created_at, n.rowid");

        let notes = query_builder
            .build_query_as::<Note>()
            .fetch_all(&self.pool)
            .await?;

        Ok(notes)
    }

    /// Replace the text of the note `(user_id, title)`
    pub async fn update_note(
        &self,
        user_id: &str,
        title: &str,
        note: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE notes SET note = ?, updated_at = ? WHERE user_id = ? AND title = ?")
                .bind(note)
                .bind(updated_at)
                .bind(user_id)
                .bind(title)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete the note `(user_id, title)`
    pub async fn delete_note(&self, user_id: &str, title: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notes WHERE user_id = ? AND title = ?")
            .bind(user_id)
            .bind(title)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Member lists
    // =========================================================================

    /// Create the list of the given type
    ///
    /// # Errors
    /// `Conflict` if that list already exists
    pub async fn insert_list(&self, list: &MemberList) -> Result<(), AppError> {
        sqlx::query("INSERT INTO member_lists (list_type, name, created_at) VALUES (?, ?, ?)")
            .bind(&list.list_type)
            .bind(&list.name)
            .bind(list.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "this list already exists"))?;

        Ok(())
    }

    /// Get list header by type
    pub async fn get_list(&self, list_type: ListType) -> Result<Option<MemberList>, AppError> {
        let list = sqlx::query_as::<_, MemberList>("SELECT * FROM member_lists WHERE list_type = ?")
            .bind(list_type.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(list)
    }

    /// Get all list headers
    pub async fn list_lists(&self) -> Result<Vec<MemberList>, AppError> {
        let lists = sqlx::query_as::<_, MemberList>(
            "SELECT * FROM member_lists ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lists)
    }

    /// Delete a list and its members
    pub async fn delete_list(&self, list_type: ListType) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM member_lists WHERE list_type = ?")
            .bind(list_type.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get members of a list in insertion order
    pub async fn get_list_members(&self, list_type: ListType) -> Result<Vec<ListMember>, AppError> {
        let members = sqlx::query_as::<_, ListMember>(
            "SELECT * FROM list_members WHERE list_type = ? ORDER BY created_at, rowid",
        )
        .bind(list_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Get a member of a list by name
    pub async fn get_list_member(
        &self,
        list_type: ListType,
        name: &str,
    ) -> Result<Option<ListMember>, AppError> {
        let member = sqlx::query_as::<_, ListMember>(
            "SELECT * FROM list_members WHERE list_type = ? AND name = ?",
        )
        .bind(list_type.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Add a member to a list
    ///
    /// # Errors
    /// `Conflict` if the list already has a member with that name
    pub async fn insert_list_member(&self, member: &ListMember) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO list_members (
                id, list_type, name, gender, description, user_avaliation, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&member.id)
        .bind(&member.list_type)
        .bind(&member.name)
        .bind(&member.gender)
        .bind(&member.description)
        .bind(member.user_avaliation)
        .bind(member.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "this member is already on the list"))?;

        Ok(())
    }

    /// Patch a list member, addressed by current name
    pub async fn update_list_member(
        &self,
        list_type: ListType,
        name: &str,
        patch: &MemberPatch,
    ) -> Result<bool, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new("UPDATE list_members SET ");
        {
            let mut separated = query_builder.separated(", ");
            separated.push("id = id");
            if let Some(value) = &patch.name {
                separated.push("name = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.gender {
                separated.push("gender = ").push_bind_unseparated(value);
            }
            if let Some(value) = &patch.description {
                separated.push("description = ").push_bind_unseparated(value);
            }
            if let Some(value) = patch.user_avaliation {
                separated
                    .push("user_avaliation = ")
                    .push_bind_unseparated(value);
            }
        }
        query_builder
            .push(" WHERE list_type = ")
            .push_bind(list_type.as_str())
            .push(" AND name = ")
            .push_bind(name);

        let result = query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "this member is already on the list"))?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a member from a list
    pub async fn delete_list_member(&self, list_type: ListType, name: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM list_members WHERE list_type = ? AND name = ?")
            .bind(list_type.as_str())
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
