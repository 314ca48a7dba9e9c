use bevy::prelude::*;

pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Selection::default())
            .add_observer(on_selected_removed);
    }
}

/// Marker component placed on the selected prop. At most one entity has it.
#[derive(Component)]
pub struct Selected;

/// Resource tracking the single selected prop.
#[derive(Resource, Default, Debug)]
pub struct Selection {
    entity: Option<Entity>,
}

impl Selection {
    /// Select `entity`, deselecting the previous selection first.
    pub fn select(&mut self, commands: &mut Commands, entity: Entity) {
        if let Some(previous) = self.entity {
            if previous != entity {
                if let Ok(mut ec) = commands.get_entity(previous) {
                    ec.remove::<Selected>();
                }
            }
        }
        self.entity = Some(entity);
        commands.entity(entity).insert(Selected);
    }

    pub fn clear(&mut self, commands: &mut Commands) {
        if let Some(previous) = self.entity.take() {
            if let Ok(mut ec) = commands.get_entity(previous) {
                ec.remove::<Selected>();
            }
        }
    }

    pub fn primary(&self) -> Option<Entity> {
        self.entity
    }

    pub fn is_selected(&self, entity: Entity) -> bool {
        self.entity == Some(entity)
    }

    /// Forget the selection without touching components. Used when the
    /// marker is already gone.
    pub(crate) fn forget(&mut self, entity: Entity) {
        if self.entity == Some(entity) {
            self.entity = None;
        }
    }
}

/// Keep the resource in sync when `Selected` disappears by other means
/// (e.g. the entity was despawned).
fn on_selected_removed(trigger: On<Remove, Selected>, mut selection: ResMut<Selection>) {
    selection.forget(trigger.event_target());
}
