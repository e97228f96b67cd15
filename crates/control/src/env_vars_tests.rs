// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_support::{ctx, fixture};
use crate::ControlError;
use relay_wire::{
    EnvVarCreateRequest, EnvVarUpdateRequest, SystemEnvVarCreateRequest, SystemEnvVarUpdateRequest,
};

#[test]
fn user_env_var_crud() {
    let fx = fixture();
    let ctx = ctx("u1");
    let created = fx
        .control
        .create_user_env_var(
            &ctx,
            EnvVarCreateRequest {
                key: "API_KEY".into(),
                value: "secret".into(),
                description: Some("main key".into()),
            },
        )
        .unwrap();
    assert!(created.is_set);

    let updated = fx
        .control
        .update_user_env_var(
            &ctx,
            &created.id,
            EnvVarUpdateRequest { value: Some("rotated".into()), description: None },
        )
        .unwrap();
    assert!(updated.is_set);

    fx.control.delete_user_env_var(&ctx, &created.id).unwrap();
    assert!(fx.control.list_public_env_vars(&ctx).unwrap().is_empty());
}

#[test]
fn duplicate_keys_conflict() {
    let fx = fixture();
    let ctx = ctx("u1");
    let request = EnvVarCreateRequest { key: "K".into(), value: "v".into(), description: None };
    fx.control.create_user_env_var(&ctx, request.clone()).unwrap();
    let err = fx.control.create_user_env_var(&ctx, request).unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}

#[test]
fn empty_user_values_rejected() {
    let fx = fixture();
    let err = fx
        .control
        .create_user_env_var(
            &ctx("u1"),
            EnvVarCreateRequest { key: "K".into(), value: "  ".into(), description: None },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::BadRequest(_)));
}

#[test]
fn system_user_id_is_reserved() {
    let fx = fixture();
    let err = fx.control.list_public_env_vars(&ctx("__system__")).unwrap_err();
    assert!(matches!(err, ControlError::Forbidden(_)));
}

#[test]
fn env_map_user_shadows_system_and_drops_unset() {
    let fx = fixture();
    let ctx = ctx("u1");

    fx.control
        .create_system_env_var(SystemEnvVarCreateRequest {
            key: "SHARED".into(),
            value: "system-value".into(),
            description: None,
        })
        .unwrap();
    fx.control
        .create_system_env_var(SystemEnvVarCreateRequest {
            key: "DECLARED_UNSET".into(),
            value: "".into(),
            description: None,
        })
        .unwrap();
    fx.control
        .create_user_env_var(
            &ctx,
            EnvVarCreateRequest { key: "SHARED".into(), value: "user-value".into(), description: None },
        )
        .unwrap();

    let map = fx.control.env_map(&ctx).unwrap();
    assert_eq!(map.get("SHARED").map(String::as_str), Some("user-value"));
    assert!(!map.contains_key("DECLARED_UNSET"));
}

#[test]
fn public_listing_shows_is_set_without_values() {
    let fx = fixture();
    let ctx = ctx("u1");
    fx.control
        .create_system_env_var(SystemEnvVarCreateRequest {
            key: "UNSET".into(),
            value: "".into(),
            description: None,
        })
        .unwrap();

    let listed = fx.control.list_public_env_vars(&ctx).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].is_set);
    // The view type has no value field at all; nothing to redact.
}

#[test]
fn system_env_var_update_and_delete() {
    let fx = fixture();
    let created = fx
        .control
        .create_system_env_var(SystemEnvVarCreateRequest {
            key: "SYS".into(),
            value: "".into(),
            description: None,
        })
        .unwrap();
    assert_eq!(created.value, "");

    let updated = fx
        .control
        .update_system_env_var(
            &created.id,
            SystemEnvVarUpdateRequest { value: Some("now-set".into()), description: None },
        )
        .unwrap();
    assert_eq!(updated.value, "now-set");

    fx.control.delete_system_env_var(&created.id).unwrap();
    assert!(fx.control.list_system_env_vars().unwrap().is_empty());
}

#[test]
fn user_cannot_touch_system_vars_through_user_surface() {
    let fx = fixture();
    let created = fx
        .control
        .create_system_env_var(SystemEnvVarCreateRequest {
            key: "SYS".into(),
            value: "v".into(),
            description: None,
        })
        .unwrap();

    let err = fx
        .control
        .update_user_env_var(
            &ctx("u1"),
            &created.id,
            EnvVarUpdateRequest { value: Some("hax".into()), description: None },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::NotFound(_)));
}
