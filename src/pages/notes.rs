// src/pages/notes.rs
use tracing::debug;

use super::{Action, FileRead, Page, PageContext, PageError, PageId, CONFIRM_DELETE_NOTE};
use crate::document::{groups, ids};
use crate::model::NoteDraft;
use crate::render::{render_notes, NoteQuery};

const FORM_INPUTS: [&str; 3] = [ids::NOTE_TITLE, ids::NOTE_CONTENT, ids::NOTE_CATEGORY];

/// Notes grid with search, category filter and the new/edit form.
#[derive(Debug, Default)]
pub struct NotesPage {
    query: NoteQuery,
    /// Note the form is editing; `None` while it creates a new one.
    editing: Option<i64>,
}

impl NotesPage {
    fn render(&self, ctx: &mut PageContext<'_>) {
        let html = render_notes(ctx.state.notes(), &self.query);
        ctx.document.set_inner_html(ids::NOTES_GRID, html);
    }

    fn active_filter(&self) -> String {
        self.query
            .category
            .as_ref()
            .map_or_else(|| "all".to_string(), ToString::to_string)
    }

    fn open_form(ctx: &mut PageContext<'_>, title: &str, button: &str) {
        ctx.document.set_text(ids::NOTE_MODAL_TITLE, title);
        ctx.document.set_text(ids::NOTE_SAVE_BUTTON, button);
    }

    fn commit(ctx: &mut PageContext<'_>, editing: Option<i64>, draft: NoteDraft) {
        match editing {
            Some(id) => {
                let result = ctx.state.update_note(id, draft);
                if ctx.saved(result) == Some(false) {
                    debug!(id, "edited note no longer exists");
                }
            }
            None => {
                let result = ctx.state.add_note(draft);
                ctx.saved(result);
            }
        }
    }

    fn note_exists(ctx: &PageContext<'_>, id: i64) -> bool {
        ctx.state.notes().iter().any(|n| n.id == id)
    }
}

impl Page for NotesPage {
    fn id(&self) -> PageId {
        PageId::Notes
    }

    fn init(&mut self, ctx: &mut PageContext<'_>) {
        ctx.document.set_active(groups::NOTE_CATEGORY_FILTER, self.active_filter());
        self.render(ctx);
    }

    fn handle(&mut self, ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError> {
        match action {
            Action::SearchNotes(search) => {
                ctx.document.set_value(ids::NOTE_SEARCH, search.clone());
                self.query.search = search;
            }
            Action::FilterNotes(category) => {
                self.query.category = category;
                ctx.document.set_active(groups::NOTE_CATEGORY_FILTER, self.active_filter());
            }
            Action::NewNote => {
                self.editing = None;
                ctx.document.clear_values(&FORM_INPUTS);
                Self::open_form(ctx, "Add New Note", "Save Note");
                return Ok(());
            }
            Action::EditNote(id) => {
                let Some(note) = ctx.state.notes().iter().find(|n| n.id == id).cloned() else {
                    debug!(id, "edit requested for unknown note");
                    return Ok(());
                };
                self.editing = Some(id);
                ctx.document.set_value(ids::NOTE_TITLE, note.title);
                ctx.document.set_value(ids::NOTE_CONTENT, note.content);
                ctx.document.set_value(ids::NOTE_CATEGORY, note.category.to_string());
                Self::open_form(ctx, "Edit Note", "Update Note");
                return Ok(());
            }
            Action::SaveNote(draft) => {
                if draft.title.trim().is_empty() {
                    return Err(PageError::InvalidInput("Note title cannot be empty".into()));
                }
                let editing = self.editing.take();
                ctx.document.clear_values(&FORM_INPUTS);
                if draft.image.is_some() {
                    ctx.start_read(FileRead::NoteForm { editing, draft });
                    return Ok(());
                }
                Self::commit(ctx, editing, draft);
            }
            Action::DeleteNote(id) => {
                if !Self::note_exists(ctx, id) {
                    debug!(id, "delete requested for unknown note");
                    return Ok(());
                }
                if !ctx.confirm(CONFIRM_DELETE_NOTE) {
                    return Ok(());
                }
                let result = ctx.state.delete_note(id);
                ctx.saved(result);
            }
            Action::TogglePin(id) => {
                let result = ctx.state.toggle_pin(id);
                ctx.saved(result);
            }
            Action::ToggleStar(id) => {
                let result = ctx.state.toggle_star(id);
                ctx.saved(result);
            }
            Action::DropNote { dragged, target } => {
                let result = ctx.state.move_note(dragged, target);
                if ctx.saved(result) == Some(false) {
                    debug!(dragged, target, "drop ignored");
                }
            }
            Action::AttachNoteImage { id, data_uri } => {
                if Self::note_exists(ctx, id) {
                    ctx.start_read(FileRead::NoteImage { id, data_uri });
                }
                return Ok(());
            }
            other => return Err(PageError::unsupported(PageId::Notes, &other)),
        }
        self.render(ctx);
        Ok(())
    }

    fn on_file_read(&mut self, ctx: &mut PageContext<'_>, read: FileRead) -> Result<(), PageError> {
        match read {
            FileRead::NoteForm { editing, draft } => Self::commit(ctx, editing, draft),
            FileRead::NoteImage { id, data_uri } => {
                let result = ctx.state.set_note_image(id, data_uri);
                ctx.saved(result);
            }
            other => {
                debug!(read = ?other, "read not meant for the notes page");
                return Ok(());
            }
        }
        self.render(ctx);
        Ok(())
    }

    fn teardown(&mut self, _ctx: &mut PageContext<'_>) {
        self.editing = None;
    }
}
