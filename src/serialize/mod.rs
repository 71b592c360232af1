//! Versioned binary serialization shared between two transports: a framed,
//! zero-copy-friendly buffer ([`to_frames`]/[`from_frames`]) and a
//! length-prefixed byte stream ([`to_stream`]/[`from_stream`]).
//!
//! Both transports encode the exact same logical sequence of [`Frame`]s in
//! the exact same order; only how a frame is physically packed differs.
//! That sequence is produced and consumed by a single pair of generic
//! functions ([`write_model_data`]/[`read_model_data`]) so the two
//! transports can never drift apart.

pub mod frame;

use crate::error::{Error, Result};
use crate::model::{Model, ModelData, ModelParam};
use crate::tree::{OptionalStat, Tree};
use crate::typeinfo::{LeafOutputType, NodeType, Operator, TaskType, ThresholdType, TypeInfo};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use frame::Frame;
use log::{info, warn};
use std::io::{Read, Write};

/// The version this build of the crate writes, and the version against
/// which an incoming file's version is checked.
pub const CURRENT_VERSION: (i32, i32, i32) = (4, 0, 0);

/// One forward-compatibility extension field: a name plus an opaque,
/// length-prefixed byte payload. A reader that does not recognize `name`
/// can still skip the field because its length is self-describing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionalField {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Checks whether a file stamped `file_version` can be read by a reader
/// built at `reader_version`. The only cross-major bridges are the
/// historical 3.9 -> 4.x transition and the general old-major ->
/// newer-major-4+ forward read granted from 4.x into any reader of
/// major >= 5.
pub fn is_compatible(file_version: (i32, i32, i32), reader_version: (i32, i32, i32)) -> bool {
    let (f_major, f_minor, _) = file_version;
    let (r_major, _, _) = reader_version;
    if f_major == r_major {
        return true;
    }
    if f_major == 3 && f_minor == 9 && r_major == 4 {
        return true;
    }
    if f_major == 4 && r_major >= 5 {
        return true;
    }
    false
}

fn check_version(file_version: (i32, i32, i32)) -> Result<()> {
    if !is_compatible(file_version, CURRENT_VERSION) {
        return Err(Error::Serialization(format!(
            "model version {:?} is incompatible with reader version {:?}",
            file_version, CURRENT_VERSION
        )));
    }
    if file_version.1 > CURRENT_VERSION.1 && file_version.0 == CURRENT_VERSION.0 {
        warn!(
            "model was written by a newer minor version {:?} than this reader {:?}; \
             unrecognized extension fields will be skipped",
            file_version, CURRENT_VERSION
        );
    }
    Ok(())
}

/// Element types a [`Tree`] can be generic over and that this module knows
/// how to pack into/unpack from a [`Frame`]. Implemented for `f32`/`f64`
/// only, matching the two legal `(threshold, leaf)` pairs.
trait WireFloat: Sized + Copy {
    fn type_tag() -> TypeInfo;
    fn to_frame(values: &[Self]) -> Frame;
    fn from_frame(frame: &Frame) -> Result<Vec<Self>>;
}

impl WireFloat for f32 {
    fn type_tag() -> TypeInfo {
        TypeInfo::Float32
    }
    fn to_frame(values: &[Self]) -> Frame {
        Frame::vec_f32(values)
    }
    fn from_frame(frame: &Frame) -> Result<Vec<Self>> {
        frame.as_f32_vec()
    }
}

impl WireFloat for f64 {
    fn type_tag() -> TypeInfo {
        TypeInfo::Float64
    }
    fn to_frame(values: &[Self]) -> Frame {
        Frame::vec_f64(values)
    }
    fn from_frame(frame: &Frame) -> Result<Vec<Self>> {
        frame.as_f64_vec()
    }
}

fn node_type_frame(col: &[NodeType]) -> Frame {
    let bytes: Vec<u8> = col.iter().map(|t| t.as_u8()).collect();
    Frame::from_u8_vec("u8", 1, &bytes)
}

fn node_type_from_frame(frame: &Frame) -> Result<Vec<NodeType>> {
    frame
        .as_u8_vec()?
        .iter()
        .map(|&b| {
            NodeType::from_u8(b)
                .ok_or_else(|| Error::Serialization(format!("unknown node_type tag {}", b)))
        })
        .collect()
}

fn op_frame(col: &[Operator]) -> Frame {
    let bytes: Vec<u8> = col.iter().map(|o| o.as_u8()).collect();
    Frame::from_u8_vec("u8", 1, &bytes)
}

fn op_from_frame(frame: &Frame) -> Result<Vec<Operator>> {
    frame
        .as_u8_vec()?
        .iter()
        .map(|&b| {
            Operator::from_u8(b)
                .ok_or_else(|| Error::Serialization(format!("unknown comparison_op tag {}", b)))
        })
        .collect()
}

fn stat_frames<V: Copy>(
    col: &[OptionalStat<V>],
    to_frame: impl Fn(&[V]) -> Frame,
) -> (Frame, Frame) {
    let values: Vec<V> = col.iter().map(|s| s.value).collect();
    let present: Vec<bool> = col.iter().map(|s| s.present).collect();
    (to_frame(&values), Frame::vec_u8_bool(&present))
}

fn stat_from_frames<V: Copy + Default>(
    values: Vec<V>,
    present: &Frame,
) -> Result<Vec<OptionalStat<V>>> {
    let present = present.as_bool_vec()?;
    if present.len() != values.len() {
        return Err(Error::Serialization(
            "optional-stat value/present arrays have mismatched length".into(),
        ));
    }
    Ok(values
        .into_iter()
        .zip(present)
        .map(|(value, present)| OptionalStat { value, present })
        .collect())
}

fn push_string(out: &mut Vec<Frame>, s: &str) {
    out.push(Frame::bytes(s.as_bytes()));
}

fn pop_string(cur: &mut frame::FrameCursor) -> Result<String> {
    let bytes = cur.next()?.as_bytes()?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Serialization(format!("string field is not valid UTF-8: {}", e)))
}

fn push_optional_fields(out: &mut Vec<Frame>, fields: &[OptionalField]) {
    out.push(Frame::scalar_i32(fields.len() as i32));
    for field in fields {
        push_string(out, &field.name);
        out.push(Frame::bytes(&field.payload));
    }
}

/// Read an extension slot, skipping every field regardless of whether its
/// name is recognized: this build defines no optional fields of its own,
/// so every slot it reads is, today, entirely forward-compatibility
/// padding written by a future version.
fn pop_and_skip_optional_fields(cur: &mut frame::FrameCursor) -> Result<Vec<OptionalField>> {
    let count = cur.next()?.as_i32()?;
    if count < 0 {
        return Err(Error::Serialization(
            "negative optional-field count".into(),
        ));
    }
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = pop_string(cur)?;
        let payload = cur.next()?.as_bytes()?.to_vec();
        fields.push(OptionalField { name, payload });
    }
    Ok(fields)
}

fn write_tree<T: ThresholdType + WireFloat, L: LeafOutputType + WireFloat>(
    out: &mut Vec<Frame>,
    tree: &Tree<T, L>,
) {
    out.push(Frame::scalar_i32(tree.num_nodes() as i32));
    out.push(Frame::scalar_u8(tree.has_categorical_split() as u8));

    out.push(node_type_frame(tree.node_type_col()));
    out.push(Frame::vec_i32(tree.left_child_col()));
    out.push(Frame::vec_i32(tree.right_child_col()));
    out.push(Frame::vec_u32(tree.split_feature_index_col()));
    out.push(Frame::vec_u8_bool(tree.default_left_col()));
    out.push(L::to_frame(tree.leaf_value_col()));
    out.push(T::to_frame(tree.threshold_col()));
    out.push(op_frame(tree.comparison_op_col()));
    out.push(Frame::vec_u8_bool(tree.category_list_right_child_col()));

    let (pool, begin, end) = tree.leaf_vector_pool();
    out.push(L::to_frame(pool));
    out.push(Frame::vec_u32(begin));
    out.push(Frame::vec_u32(end));

    let (pool, begin, end) = tree.category_list_pool();
    out.push(Frame::vec_u32(pool));
    out.push(Frame::vec_u32(begin));
    out.push(Frame::vec_u32(end));

    let (data_count, sum_hess, gain) = tree.stat_cols();
    let (values, present) = stat_frames(data_count, Frame::vec_u64);
    out.push(values);
    out.push(present);
    let (values, present) = stat_frames(sum_hess, Frame::vec_f64);
    out.push(values);
    out.push(present);
    let (values, present) = stat_frames(gain, Frame::vec_f64);
    out.push(values);
    out.push(present);

    push_optional_fields(out, &[]); // per-tree extension slot
    push_optional_fields(out, &[]); // per-node extension slot
}

fn read_tree<T: ThresholdType + WireFloat, L: LeafOutputType + WireFloat>(
    cur: &mut frame::FrameCursor,
) -> Result<Tree<T, L>> {
    let num_nodes = cur.next()?.as_i32()?;
    if num_nodes < 0 {
        return Err(Error::Serialization("negative num_nodes".into()));
    }
    let has_categorical_split = cur.next()?.as_u8()? != 0;

    let node_type = node_type_from_frame(cur.next()?)?;
    let left_child = cur.next()?.as_i32_vec()?;
    let right_child = cur.next()?.as_i32_vec()?;
    let split_feature_index = cur.next()?.as_u32_vec()?;
    let default_left = cur.next()?.as_bool_vec()?;
    let leaf_value = L::from_frame(cur.next()?)?;
    let threshold = T::from_frame(cur.next()?)?;
    let comparison_op = op_from_frame(cur.next()?)?;
    let category_list_right_child = cur.next()?.as_bool_vec()?;

    let leaf_vector = L::from_frame(cur.next()?)?;
    let leaf_vector_begin = cur.next()?.as_u32_vec()?;
    let leaf_vector_end = cur.next()?.as_u32_vec()?;

    let category_list = cur.next()?.as_u32_vec()?;
    let category_list_begin = cur.next()?.as_u32_vec()?;
    let category_list_end = cur.next()?.as_u32_vec()?;

    let data_count_values = cur.next()?.as_u64_vec()?;
    let data_count_present = cur.next()?;
    let data_count = stat_from_frames(data_count_values, data_count_present)?;
    let sum_hess_values = cur.next()?.as_f64_vec()?;
    let sum_hess_present = cur.next()?;
    let sum_hess = stat_from_frames(sum_hess_values, sum_hess_present)?;
    let gain_values = cur.next()?.as_f64_vec()?;
    let gain_present = cur.next()?;
    let gain = stat_from_frames(gain_values, gain_present)?;

    pop_and_skip_optional_fields(cur)?; // per-tree extension slot
    pop_and_skip_optional_fields(cur)?; // per-node extension slot

    let expected = num_nodes as usize;
    if node_type.len() != expected || left_child.len() != expected {
        return Err(Error::Serialization(
            "tree column length disagrees with num_nodes".into(),
        ));
    }

    Ok(Tree::from_columns(
        node_type,
        left_child,
        right_child,
        split_feature_index,
        default_left,
        threshold,
        comparison_op,
        category_list_right_child,
        leaf_value,
        leaf_vector,
        leaf_vector_begin,
        leaf_vector_end,
        category_list,
        category_list_begin,
        category_list_end,
        data_count,
        sum_hess,
        gain,
        has_categorical_split,
    ))
}

fn write_model_data<T: ThresholdType + WireFloat, L: LeafOutputType + WireFloat>(
    data: &ModelData<T, L>,
) -> Vec<Frame> {
    let mut out = Vec::new();
    let param = &data.param;

    out.push(Frame::scalar_i32(param.version.0));
    out.push(Frame::scalar_i32(param.version.1));
    out.push(Frame::scalar_i32(param.version.2));
    out.push(Frame::scalar_u8(T::type_tag().as_u8()));
    out.push(Frame::scalar_u8(L::type_tag().as_u8()));
    out.push(Frame::scalar_u64(data.num_tree() as u64));

    out.push(Frame::scalar_i32(param.num_feature));
    out.push(Frame::scalar_u8(param.task_type.as_u8()));
    out.push(Frame::scalar_u8(param.average_tree_output as u8));
    out.push(Frame::scalar_u32(param.num_target));
    out.push(Frame::vec_u32(&param.num_class));
    out.push(Frame::vec_u32(&param.leaf_vector_shape));
    out.push(Frame::vec_i32(&data.target_id));
    out.push(Frame::vec_i32(&data.class_id));
    push_string(&mut out, &param.postprocessor);
    out.push(Frame::scalar_f32(param.sigmoid_alpha));
    out.push(Frame::scalar_f32(param.ratio_c));
    out.push(Frame::vec_f64(&param.base_scores));
    push_string(&mut out, &param.attributes);

    push_optional_fields(&mut out, &[]); // per-model extension slot

    for tree in &data.trees {
        write_tree(&mut out, tree);
    }

    out
}

fn read_model_data<T: ThresholdType + WireFloat, L: LeafOutputType + WireFloat>(
    cur: &mut frame::FrameCursor,
    version: (i32, i32, i32),
    num_tree: u64,
) -> Result<ModelData<T, L>> {
    let num_feature = cur.next()?.as_i32()?;
    let task_tag = cur.next()?.as_u8()?;
    let task_type = TaskType::from_u8(task_tag)
        .ok_or_else(|| Error::Serialization(format!("unknown task_type tag {}", task_tag)))?;
    let average_tree_output = cur.next()?.as_u8()? != 0;
    let num_target = cur.next()?.as_u32()?;
    let num_class = cur.next()?.as_u32_vec()?;
    let leaf_vector_shape_vec = cur.next()?.as_u32_vec()?;
    if leaf_vector_shape_vec.len() != 2 {
        return Err(Error::Serialization("leaf_vector_shape must have 2 elements".into()));
    }
    let leaf_vector_shape = [leaf_vector_shape_vec[0], leaf_vector_shape_vec[1]];
    let target_id = cur.next()?.as_i32_vec()?;
    let class_id = cur.next()?.as_i32_vec()?;
    let postprocessor = pop_string(cur)?;
    let sigmoid_alpha = cur.next()?.as_f32()?;
    let ratio_c = cur.next()?.as_f32()?;
    let base_scores = cur.next()?.as_f64_vec()?;
    let attributes = pop_string(cur)?;

    pop_and_skip_optional_fields(cur)?; // per-model extension slot

    if target_id.len() != num_tree as usize || class_id.len() != num_tree as usize {
        return Err(Error::Serialization(
            "target_id/class_id length disagrees with num_tree".into(),
        ));
    }

    let mut trees = Vec::with_capacity(num_tree as usize);
    for _ in 0..num_tree {
        let tree: Tree<T, L> = read_tree(cur)?;
        tree.validate_structure()?;
        trees.push(tree);
    }

    let param = ModelParam {
        num_feature,
        task_type,
        average_tree_output,
        num_target,
        num_class,
        leaf_vector_shape,
        postprocessor,
        sigmoid_alpha,
        ratio_c,
        base_scores,
        attributes,
        version,
    };
    Ok(ModelData {
        param,
        trees,
        target_id,
        class_id,
    })
}

/// Encode `model` as a flat sequence of [`Frame`]s, suitable for zero-copy
/// export to another language.
pub fn to_frames(model: &Model) -> Vec<Frame> {
    match model {
        Model::F32(data) => write_model_data(data),
        Model::F64(data) => write_model_data(data),
    }
}

/// Decode a [`Model`] from a frame sequence produced by [`to_frames`].
pub fn from_frames(frames: &[Frame]) -> Result<Model> {
    let mut cur = frame::FrameCursor::new(frames);
    let version = (
        cur.next()?.as_i32()?,
        cur.next()?.as_i32()?,
        cur.next()?.as_i32()?,
    );
    check_version(version)?;
    let threshold_tag = cur.next()?.as_u8()?;
    let leaf_tag = cur.next()?.as_u8()?;
    let num_tree = cur.next()?.as_u64()?;

    let threshold_type = TypeInfo::from_u8(threshold_tag)
        .ok_or_else(|| Error::Serialization(format!("unknown threshold type tag {}", threshold_tag)))?;
    let leaf_type = TypeInfo::from_u8(leaf_tag)
        .ok_or_else(|| Error::Serialization(format!("unknown leaf type tag {}", leaf_tag)))?;

    let model = match (threshold_type, leaf_type) {
        (TypeInfo::Float32, TypeInfo::Float32) => {
            Model::F32(read_model_data::<f32, f32>(&mut cur, version, num_tree)?)
        }
        (TypeInfo::Float64, TypeInfo::Float64) => {
            Model::F64(read_model_data::<f64, f64>(&mut cur, version, num_tree)?)
        }
        (t, l) => {
            return Err(Error::TypeMismatch(format!(
                "(threshold={}, leaf_output={}) is not a loadable pair",
                t, l
            )))
        }
    };

    if !cur.finished() {
        return Err(Error::Serialization(
            "trailing frames after a fully-decoded model".into(),
        ));
    }
    Ok(model)
}

/// Serialize `model` to `sink` as a length-prefixed byte stream. On any
/// I/O failure the write is abandoned; no partial model is ever readable
/// back from a truncated stream.
pub fn to_stream<W: Write>(model: &Model, sink: &mut W) -> Result<()> {
    info!("serializing model ({} trees) to stream", model.num_tree());
    for frame in to_frames(model) {
        write_framed(sink, &frame)?;
    }
    Ok(())
}

fn write_framed<W: Write>(sink: &mut W, frame: &Frame) -> Result<()> {
    sink.write_u32::<LittleEndian>(frame.format.len() as u32)?;
    sink.write_all(frame.format.as_bytes())?;
    sink.write_u64::<LittleEndian>(frame.item_size as u64)?;
    sink.write_u64::<LittleEndian>(frame.n_items as u64)?;
    sink.write_u64::<LittleEndian>(frame.data.len() as u64)?;
    sink.write_all(&frame.data)?;
    Ok(())
}

fn read_framed<R: Read>(source: &mut R) -> Result<Frame> {
    let format_len = source.read_u32::<LittleEndian>()? as usize;
    let mut format_bytes = vec![0u8; format_len];
    source.read_exact(&mut format_bytes)?;
    let format = String::from_utf8(format_bytes)
        .map_err(|e| Error::Serialization(format!("frame format tag is not valid UTF-8: {}", e)))?;
    let item_size = source.read_u64::<LittleEndian>()? as usize;
    let n_items = source.read_u64::<LittleEndian>()? as usize;
    let data_len = source.read_u64::<LittleEndian>()? as usize;
    let mut data = vec![0u8; data_len];
    source.read_exact(&mut data)?;
    Ok(Frame {
        format,
        item_size,
        n_items,
        data,
    })
}

/// Deserialize a [`Model`] from a byte stream written by [`to_stream`].
/// Reads until the model's frame sequence is fully consumed; does not
/// require the stream to end there.
pub fn from_stream<R: Read>(source: &mut R) -> Result<Model> {
    // The frame count isn't known up front (it depends on num_tree, which
    // is itself encoded as a frame), so the header is read first to learn
    // how many per-tree frames follow, then the rest is read frame by frame.
    let mut frames = Vec::new();
    for _ in 0..6 {
        frames.push(read_framed(source)?);
    }
    let mut cur = frame::FrameCursor::new(&frames);
    let _version = (
        cur.next()?.as_i32()?,
        cur.next()?.as_i32()?,
        cur.next()?.as_i32()?,
    );
    let _threshold_tag = cur.next()?.as_u8()?;
    let _leaf_tag = cur.next()?.as_u8()?;
    let num_tree = cur.next()?.as_u64()?;

    // Model scalar/array section: 13 frames, regardless of num_tree.
    for _ in 0..13 {
        frames.push(read_framed(source)?);
    }
    // Per-model extension slot: count frame, then 2 frames per field.
    let count_frame = read_framed(source)?;
    let field_count = count_frame.as_i32()?;
    frames.push(count_frame);
    if field_count < 0 {
        return Err(Error::Serialization("negative optional-field count".into()));
    }
    for _ in 0..(field_count as usize) {
        frames.push(read_framed(source)?);
        frames.push(read_framed(source)?);
    }

    for _ in 0..num_tree {
        read_tree_frames(source, &mut frames)?;
    }

    from_frames(&frames)
}

/// Pull one tree's worth of frames off `source`, appending them to `frames`.
/// Per-tree frame counts are fixed except for the two pool arrays (whose
/// lengths are read back from earlier frames in the same tree) and the two
/// trailing extension slots (whose field counts are self-describing).
fn read_tree_frames<R: Read>(source: &mut R, frames: &mut Vec<Frame>) -> Result<()> {
    // num_nodes, has_categorical_split, and the 9 fixed-length node columns.
    for _ in 0..11 {
        frames.push(read_framed(source)?);
    }
    // leaf_vector pool + begin/end, category_list pool + begin/end.
    for _ in 0..6 {
        frames.push(read_framed(source)?);
    }
    // data_count/sum_hess/gain value+present pairs.
    for _ in 0..6 {
        frames.push(read_framed(source)?);
    }
    // Per-tree then per-node extension slots.
    for _ in 0..2 {
        let count_frame = read_framed(source)?;
        let field_count = count_frame.as_i32()?;
        frames.push(count_frame);
        if field_count < 0 {
            return Err(Error::Serialization("negative optional-field count".into()));
        }
        for _ in 0..(field_count as usize) {
            frames.push(read_framed(source)?);
            frames.push(read_framed(source)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Builder, ModelMetadata};
    use crate::typeinfo::{Operator, TaskType, TypeInfo};

    fn stump_model() -> Model {
        let metadata = ModelMetadata {
            num_feature: 2,
            task_type: TaskType::Regressor,
            average_tree_output: false,
            num_target: 1,
            num_class: vec![1],
            leaf_vector_shape: [1, 1],
            postprocessor: "identity".to_string(),
            postprocessor_config: None,
            base_scores: vec![0.5],
            attributes: "{}".to_string(),
        };
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        b.numerical_test(0, 0.0, true, Operator::LT, 1, 2).unwrap();
        b.set_gain(1.5).unwrap();
        b.end_node().unwrap();
        b.start_node(1).unwrap();
        b.leaf_scalar(1.0).unwrap();
        b.end_node().unwrap();
        b.start_node(2).unwrap();
        b.leaf_scalar(2.0).unwrap();
        b.set_data_count(7).unwrap();
        b.end_node().unwrap();
        b.end_tree().unwrap();
        b.commit_model().unwrap()
    }

    #[test]
    fn framed_round_trip_preserves_json_dump() {
        let model = stump_model();
        let frames = to_frames(&model);
        let restored = from_frames(&frames).unwrap();
        assert_eq!(
            model.dump_as_json(false).unwrap(),
            restored.dump_as_json(false).unwrap()
        );
    }

    #[test]
    fn stream_round_trip_preserves_json_dump() {
        let model = stump_model();
        let mut buf = Vec::new();
        to_stream(&model, &mut buf).unwrap();
        let restored = from_stream(&mut &buf[..]).unwrap();
        assert_eq!(
            model.dump_as_json(false).unwrap(),
            restored.dump_as_json(false).unwrap()
        );
    }

    #[test]
    fn truncated_stream_is_a_serialization_error() {
        let model = stump_model();
        let mut buf = Vec::new();
        to_stream(&model, &mut buf).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(matches!(
            from_stream(&mut &buf[..]),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn compatibility_matrix_matches_spec() {
        // =3.9 row
        assert!(is_compatible((3, 9, 0), (3, 9, 0)));
        assert!(is_compatible((3, 9, 0), (4, 0, 0)));
        assert!(is_compatible((3, 9, 0), (4, 3, 0)));
        assert!(!is_compatible((3, 9, 0), (5, 0, 0)));
        // =4.0 row
        assert!(!is_compatible((4, 0, 0), (3, 9, 0)));
        assert!(is_compatible((4, 0, 0), (4, 0, 0)));
        assert!(is_compatible((4, 0, 0), (4, 3, 0)));
        assert!(is_compatible((4, 0, 0), (5, 0, 0)));
        // 4.x>4.0 row
        assert!(!is_compatible((4, 2, 0), (3, 9, 0)));
        assert!(is_compatible((4, 2, 0), (4, 0, 0)));
        assert!(is_compatible((4, 2, 0), (4, 3, 0)));
        assert!(is_compatible((4, 2, 0), (5, 0, 0)));
        // >=5.0 row
        assert!(!is_compatible((5, 0, 0), (3, 9, 0)));
        assert!(!is_compatible((5, 0, 0), (4, 0, 0)));
        assert!(!is_compatible((5, 0, 0), (4, 3, 0)));
        assert!(is_compatible((5, 0, 0), (5, 0, 0)));
    }

    #[test]
    fn incompatible_major_version_is_fatal() {
        let model = stump_model();
        let mut frames = to_frames(&model);
        frames[0] = Frame::scalar_i32(999);
        assert!(matches!(from_frames(&frames), Err(Error::Serialization(_))));
    }
}
