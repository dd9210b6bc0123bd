diesel::table! {
    availabilities (id) {
        id -> Uuid,
        date -> Date,
        time_slots -> Jsonb,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        date -> Date,
        time -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(availabilities, bookings, users);
