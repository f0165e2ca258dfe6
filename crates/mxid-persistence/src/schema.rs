//! Esquema Diesel declarado a mano. Los DDL correspondientes (por backend)
//! viven en `ddl`; ambos deben mantenerse alineados.

diesel::table! {
    invite_3pid (id) {
        id -> Text,
        room_id -> Text,
        sender -> Text,
        medium -> Text,
        address -> Text,
        token -> Text,
        properties -> Text,
    }
}

diesel::table! {
    invite_3pid_history (id) {
        id -> Text,
        room_id -> Text,
        sender -> Text,
        medium -> Text,
        address -> Text,
        token -> Text,
        properties -> Text,
        resolved_to -> Text,
        resolved_at -> BigInt,
        could_publish -> Bool,
    }
}

diesel::table! {
    session_3pid (id) {
        id -> Text,
        server -> Text,
        medium -> Text,
        address -> Text,
        secret -> Text,
        attempt -> Integer,
        next_link -> Nullable<Text>,
        token -> Text,
        created_at -> BigInt,
        validated -> Bool,
        validated_at -> Nullable<BigInt>,
    }
}

diesel::table! {
    as_txn (localpart, transaction_id) {
        localpart -> Text,
        transaction_id -> Text,
        completed_at -> BigInt,
        result -> Text,
    }
}

diesel::table! {
    account_token (token) {
        token -> Text,
        token_type -> Text,
        user_id -> Text,
        created_at -> BigInt,
        expires_after -> Nullable<BigInt>,
    }
}

diesel::table! {
    accepted (id) {
        id -> BigInt,
        url -> Text,
        user_id -> Text,
        accepted_at -> BigInt,
    }
}

diesel::table! {
    hashes (id) {
        id -> BigInt,
        mxid -> Text,
        medium -> Text,
        address -> Text,
        hash -> Text,
    }
}

diesel::table! {
    changelog (id) {
        id -> Text,
        created_at -> BigInt,
        comment -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    invite_3pid,
    invite_3pid_history,
    session_3pid,
    as_txn,
    account_token,
    accepted,
    hashes,
    changelog,
);
