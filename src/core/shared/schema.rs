diesel::table! {
    admins (id) {
        id -> Int4,
        email -> Varchar,
        password_hash -> Nullable<Text>,
    }
}

diesel::table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    category_samples (id) {
        id -> Int4,
        category_id -> Int4,
        text -> Text,
    }
}

diesel::table! {
    organizations (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        flats_count -> Int4,
        password_hash -> Nullable<Text>,
    }
}

diesel::table! {
    operators (id) {
        id -> Int4,
        organization_id -> Int4,
        phone -> Varchar,
        name -> Varchar,
        password_hash -> Nullable<Text>,
        responsible_categories -> Array<Int4>,
    }
}

diesel::table! {
    owners (id) {
        id -> Int4,
        organization_id -> Int4,
        phone -> Varchar,
        name -> Varchar,
        address -> Text,
        password_hash -> Nullable<Text>,
    }
}

diesel::table! {
    password_codes (role, login) {
        role -> Varchar,
        login -> Varchar,
        code -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    requests (id) {
        id -> Int4,
        organization_id -> Int4,
        owner_id -> Int4,
        operator_id -> Nullable<Int4>,
        category_id -> Nullable<Int4>,
        text -> Text,
        response -> Nullable<Text>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(category_samples -> categories (category_id));
diesel::joinable!(operators -> organizations (organization_id));
diesel::joinable!(owners -> organizations (organization_id));
diesel::joinable!(requests -> categories (category_id));
diesel::joinable!(requests -> operators (operator_id));
diesel::joinable!(requests -> owners (owner_id));

diesel::allow_tables_to_appear_in_same_query!(
    admins,
    categories,
    category_samples,
    organizations,
    operators,
    owners,
    password_codes,
    requests,
);
