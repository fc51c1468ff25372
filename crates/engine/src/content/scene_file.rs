use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use super::error::{ContentErrorCode, ContentLoadError, SourceLocation};
use super::layout::{PlayerRecord, RecordKind, SceneLayout, SceneLayoutError, SceneRecord};

const SCENE_ATTRIBUTES: &[&str] = &["width", "height"];
const PLAYER_ATTRIBUTES: &[&str] = &["x", "y", "size", "speed"];
const OBSTACLE_ATTRIBUTES: &[&str] = &["x", "y", "width", "height"];
const MARKER_ATTRIBUTES: &[&str] = &["id", "x", "y", "width", "height"];

pub fn load_scene_layout(path: &Path) -> Result<SceneLayout, ContentLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentLoadError::read(path, source))?;
    parse_scene_layout(path, &raw)
}

/// Parses a `<Scene>` document. Child order is significant: markers keep the
/// order they are declared in.
pub fn parse_scene_layout(file_path: &Path, raw: &str) -> Result<SceneLayout, ContentLoadError> {
    let doc = Document::parse(raw).map_err(|error| {
        ContentLoadError::new(
            ContentErrorCode::XmlMalformed,
            format!("malformed XML: {error}"),
            file_path,
        )
        .at(Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }))
    })?;
    let ctx = XmlContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Scene" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Scene>".to_string(),
            root,
        ));
    }
    ctx.check_attributes(root, SCENE_ATTRIBUTES)?;
    let width = ctx.int_attr(root, "width")?;
    let height = ctx.int_attr(root, "height")?;

    let mut player: Option<(PlayerRecord, Node<'_, '_>)> = None;
    let mut records = Vec::<SceneRecord>::new();
    let mut record_nodes = Vec::<Node<'_, '_>>::new();

    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "Player" => {
                if player.is_some() {
                    return Err(ctx.error_at(
                        ContentErrorCode::DuplicateElement,
                        "<Scene> may declare <Player> only once".to_string(),
                        child,
                    ));
                }
                ctx.check_attributes(child, PLAYER_ATTRIBUTES)?;
                let record = PlayerRecord {
                    x: ctx.int_attr(child, "x")?,
                    y: ctx.int_attr(child, "y")?,
                    size: ctx.int_attr(child, "size")?,
                    speed: ctx.int_attr(child, "speed")?,
                };
                player = Some((record, child));
            }
            "Obstacle" => {
                ctx.check_attributes(child, OBSTACLE_ATTRIBUTES)?;
                records.push(SceneRecord {
                    x: ctx.int_attr(child, "x")?,
                    y: ctx.int_attr(child, "y")?,
                    width: ctx.int_attr(child, "width")?,
                    height: ctx.int_attr(child, "height")?,
                    kind: RecordKind::Obstacle,
                    id: None,
                });
                record_nodes.push(child);
            }
            "Marker" => {
                ctx.check_attributes(child, MARKER_ATTRIBUTES)?;
                records.push(SceneRecord {
                    x: ctx.int_attr(child, "x")?,
                    y: ctx.int_attr(child, "y")?,
                    width: ctx.int_attr(child, "width")?,
                    height: ctx.int_attr(child, "height")?,
                    kind: RecordKind::Marker,
                    id: child.attribute("id").map(ToString::to_string),
                });
                record_nodes.push(child);
            }
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownElement,
                    format!(
                        "unsupported element <{other}>; \
                         expected <Player>, <Obstacle> or <Marker>"
                    ),
                    child,
                ));
            }
        }
    }

    let Some((player, player_node)) = player else {
        return Err(ctx.error_at(
            ContentErrorCode::MissingElement,
            "missing required element <Player> in <Scene>".to_string(),
            root,
        ));
    };

    SceneLayout::from_records(width, height, player, &records).map_err(|error| {
        let node = match &error {
            SceneLayoutError::InvalidBounds { .. } => root,
            SceneLayoutError::InvalidPlayerSize { .. }
            | SceneLayoutError::InvalidPlayerSpeed { .. }
            | SceneLayoutError::SpawnOutOfBounds { .. } => player_node,
            SceneLayoutError::SpawnBlocked { index } => record_nodes
                .get(*index)
                .copied()
                .unwrap_or(player_node),
            other => other
                .record_index()
                .and_then(|index| record_nodes.get(index).copied())
                .unwrap_or(root),
        };
        ctx.error_at(ContentErrorCode::InvalidLayout, error.to_string(), node)
    })
}

struct XmlContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl XmlContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentLoadError::new(code, message, self.file_path).at(Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }))
    }

    fn check_attributes(
        &self,
        node: Node<'_, '_>,
        allowed: &[&str],
    ) -> Result<(), ContentLoadError> {
        for attribute in node.attributes() {
            if !allowed.contains(&attribute.name()) {
                return Err(self.error_at(
                    ContentErrorCode::UnknownAttribute,
                    format!(
                        "unknown attribute '{}' on <{}>",
                        attribute.name(),
                        node.tag_name().name()
                    ),
                    node,
                ));
            }
        }
        Ok(())
    }

    fn int_attr(&self, node: Node<'_, '_>, name: &str) -> Result<i32, ContentLoadError> {
        let Some(raw) = node.attribute(name) else {
            return Err(self.error_at(
                ContentErrorCode::MissingAttribute,
                format!(
                    "missing required attribute '{name}' on <{}>",
                    node.tag_name().name()
                ),
                node,
            ));
        };
        raw.trim().parse::<i32>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{name}' value '{raw}' is not a valid integer"),
                node,
            )
        })
    }
}
