use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MemberId, Request, StrikeCount};

/// ランキングに必要な申請者のプロフィール
///
/// ストライク数と入会日は呼び出しのたびに現在値で取り直す。
/// 返却処理でストライクが増えると次のランキングに即座に反映される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterProfile {
    pub member_id: MemberId,
    pub name: String,
    pub strike_count: StrikeCount,
    pub joined_on: NaiveDate,
}

/// 優先順位付きのリクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRequest {
    /// 1始まりの順位
    pub priority: usize,
    pub request: Request,
    pub requester: RequesterProfile,
}

/// 純粋関数：1冊の書籍に対するPendingリクエストを優先順に並べる
///
/// 順序（昇順 = 高優先）：
/// 1. 申請者のストライク数（少ない方が先）
/// 2. リクエスト日（早い方が先）
/// 3. 申請者の入会日（早い方が先、古参優遇）
/// 4. リクエストID（辞書順、決定性のため）
///
/// キャッシュしない。入力が空なら空を返す（エラーではない）。
pub fn rank_requests(mut entries: Vec<(Request, RequesterProfile)>) -> Vec<RankedRequest> {
    entries.sort_by(|(a_req, a_prof), (b_req, b_prof)| {
        a_prof
            .strike_count
            .cmp(&b_prof.strike_count)
            .then_with(|| a_req.requested_on.cmp(&b_req.requested_on))
            .then_with(|| a_prof.joined_on.cmp(&b_prof.joined_on))
            .then_with(|| a_req.request_id.cmp(&b_req.request_id))
    });

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (request, requester))| RankedRequest {
            priority: i + 1,
            request,
            requester,
        })
        .collect()
}
