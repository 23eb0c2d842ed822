/// 正規化画像座標上の2D点 (0.0〜1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 3点 a-b-c の頂点 b における角度（度、0〜180）
///
/// レイ b→a と b→c の atan2 差分を度に変換し、180度を超える場合は
/// 360 - r で反転して [0, 180] に収める。
/// 縮退入力（a == b または c == b、長さゼロのレイ）は 0.0 を返す。
pub fn angle_at(a: Point2D, b: Point2D, c: Point2D) -> f32 {
    if (a.x == b.x && a.y == b.y) || (c.x == b.x && c.y == b.y) {
        return 0.0;
    }

    let r = (f32::atan2(c.y - b.y, c.x - b.x) - f32::atan2(a.y - b.y, a.x - b.x))
        .to_degrees()
        .abs();

    if r > 180.0 {
        360.0 - r
    } else {
        r
    }
}
