// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project catalog: named repo contexts runs can bind to.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{Clock, Event, Patch, Project, ProjectId};
use relay_wire::{ProjectCreateRequest, ProjectUpdateRequest, ProjectView};

impl<C: Clock> Control<C> {
    pub fn list_projects(&self, ctx: &RequestCtx) -> Result<Vec<ProjectView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut projects: Vec<&Project> =
                state.projects.values().filter(|p| p.user_id == ctx.user_id).collect();
            projects.sort_by(|a, b| {
                b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name))
            });
            projects.into_iter().map(ProjectView::from).collect()
        }))
    }

    pub fn get_project(
        &self,
        ctx: &RequestCtx,
        project_id: &ProjectId,
    ) -> Result<ProjectView, ControlError> {
        self.store.read(|state| match state.projects.get(project_id) {
            Some(project) if project.user_id == ctx.user_id => Ok(ProjectView::from(project)),
            _ => Err(ControlError::not_found(format!("Project not found: {project_id}"))),
        })
    }

    pub fn create_project(
        &self,
        ctx: &RequestCtx,
        request: ProjectCreateRequest,
    ) -> Result<ProjectView, ControlError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ControlError::bad_request("Project name cannot be empty"));
        }
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            let taken =
                state.projects.values().any(|p| p.name == name && p.user_id == ctx.user_id);
            if taken {
                return Err(ControlError::conflict(format!("Project already exists: {name}")));
            }
            let project = Project {
                id: ProjectId::new(),
                user_id: ctx.user_id.clone(),
                name: name.clone(),
                repo_url: request.repo_url.clone(),
                git_branch: request.git_branch.clone(),
                git_token_env_key: request.git_token_env_key.clone(),
                description: request.description.clone(),
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = ProjectView::from(&project);
            Ok((vec![Event::ProjectUpserted { project }], view))
        })
    }

    pub fn update_project(
        &self,
        ctx: &RequestCtx,
        project_id: &ProjectId,
        request: ProjectUpdateRequest,
    ) -> Result<ProjectView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut project = match state.projects.get(project_id) {
                Some(project) if project.user_id == ctx.user_id => project.clone(),
                _ => {
                    return Err(ControlError::not_found(format!(
                        "Project not found: {project_id}"
                    )));
                }
            };

            if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                if name != project.name {
                    let taken = state
                        .projects
                        .values()
                        .any(|p| p.id != project.id && p.name == name && p.user_id == ctx.user_id);
                    if taken {
                        return Err(ControlError::conflict(format!(
                            "Project already exists: {name}"
                        )));
                    }
                    project.name = name.to_string();
                }
            }

            apply_patch(&mut project.repo_url, &request.repo_url);
            apply_patch(&mut project.git_branch, &request.git_branch);
            apply_patch(&mut project.git_token_env_key, &request.git_token_env_key);
            if let Some(description) = &request.description {
                project.description = Some(description.clone());
            }
            project.updated_at_ms = now;

            let view = ProjectView::from(&project);
            Ok((vec![Event::ProjectUpserted { project }], view))
        })
    }

    pub fn delete_project(
        &self,
        ctx: &RequestCtx,
        project_id: &ProjectId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            match state.projects.get(project_id) {
                Some(project) if project.user_id == ctx.user_id => {
                    Ok((vec![Event::ProjectDeleted { id: project.id }], ()))
                }
                _ => Err(ControlError::not_found(format!("Project not found: {project_id}"))),
            }
        })
    }
}

fn apply_patch(field: &mut Option<String>, patch: &Patch<String>) {
    match patch {
        Patch::Missing => {}
        Patch::Null => *field = None,
        Patch::Value(value) => *field = Some(value.clone()),
    }
}
