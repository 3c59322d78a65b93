diesel::table! {
    articles (article_id) {
        article_id -> Int4,
        title -> Varchar,
        topic -> Varchar,
        author -> Varchar,
        body -> Varchar,
        created_at -> Timestamp,
        votes -> Int4,
        article_img_url -> Nullable<Varchar>,
    }
}

diesel::table! {
    comments (comment_id) {
        comment_id -> Int4,
        body -> Varchar,
        article_id -> Int4,
        author -> Varchar,
        votes -> Int4,
        created_at -> Timestamp,
    }
}

diesel::table! {
    topics (slug) {
        slug -> Varchar,
        description -> Nullable<Varchar>,
    }
}

diesel::table! {
    users (username) {
        username -> Varchar,
        name -> Varchar,
        avatar_url -> Nullable<Varchar>,
    }
}

diesel::joinable!(articles -> topics (topic));
diesel::joinable!(articles -> users (author));
diesel::joinable!(comments -> articles (article_id));
diesel::joinable!(comments -> users (author));

diesel::allow_tables_to_appear_in_same_query!(articles, comments, topics, users,);
